use super::*;

use proptest::prelude::*;

const HEADLINE: &str = "COMING SOON";

fn headline_machine() -> TypewriterMachine {
    TypewriterMachine::new([HEADLINE], TypewriterTiming::default()).expect("machine")
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Replays every timer scheduled at or before `at` and returns the displayed text.
fn text_at(mut machine: TypewriterMachine, at: Duration) -> String {
    let mut elapsed = Duration::ZERO;
    loop {
        let delay = machine.delay();
        if elapsed + delay > at {
            return machine.text();
        }
        elapsed += delay;
        machine.fire();
    }
}

#[test]
fn rejects_empty_word_lists() {
    let none: [&str; 0] = [];
    assert!(matches!(
        TypewriterMachine::new(none, TypewriterTiming::default()),
        Err(ConfigError::NoWords)
    ));
    assert!(matches!(
        TypewriterMachine::new(["READY", ""], TypewriterTiming::default()),
        Err(ConfigError::EmptyWord { index: 1 })
    ));
}

#[test]
fn starts_empty_and_typing() {
    let machine = headline_machine();
    assert_eq!(machine.text(), "");
    assert_eq!(machine.state(), AnimationState::default());
    assert_eq!(machine.delay(), ms(150));
}

#[test]
fn follows_the_transition_table() {
    let mut machine = TypewriterMachine::new(["AB"], TypewriterTiming::default()).expect("machine");
    let mut trace = Vec::new();
    for _ in 0..9 {
        let delay = machine.delay();
        let step = machine.fire();
        trace.push((delay.as_millis(), step, machine.text()));
    }
    let expected = vec![
        (150, Step::Typed, "A".to_string()),
        (150, Step::Typed, "AB".to_string()),
        (1000, Step::PausedAfterTyping, "AB".to_string()),
        (0, Step::StartedDeleting, "AB".to_string()),
        (100, Step::Deleted, "A".to_string()),
        (100, Step::Deleted, String::new()),
        (1000, Step::PausedAfterDeleting, String::new()),
        (0, Step::NextWord, String::new()),
        (150, Step::Typed, "A".to_string()),
    ];
    assert_eq!(trace, expected);
}

#[test]
fn headline_is_fully_typed_after_one_tick_per_character() {
    let len = HEADLINE.chars().count() as u64;
    assert_eq!(text_at(headline_machine(), ms(150 * len - 1)), "COMING SOO");
    assert_eq!(text_at(headline_machine(), ms(150 * len)), HEADLINE);
}

#[test]
fn headline_holds_then_deletes_every_100ms() {
    let typed = 150 * HEADLINE.chars().count() as u64;
    assert_eq!(text_at(headline_machine(), ms(typed + 999)), HEADLINE);
    assert_eq!(text_at(headline_machine(), ms(typed + 1099)), HEADLINE);
    assert_eq!(text_at(headline_machine(), ms(typed + 1100)), "COMING SOO");
    assert_eq!(text_at(headline_machine(), ms(typed + 1200)), "COMING SO");
}

#[test]
fn headline_restarts_from_empty_after_second_pause() {
    let len = HEADLINE.chars().count() as u64;
    let emptied = 150 * len + 1000 + 100 * len;
    assert_eq!(text_at(headline_machine(), ms(emptied)), "");
    assert_eq!(text_at(headline_machine(), ms(emptied + 1149)), "");
    assert_eq!(text_at(headline_machine(), ms(emptied + 1150)), "C");
}

#[test]
fn headline_cycle_is_exactly_periodic() {
    let machine = headline_machine();
    let len = HEADLINE.chars().count() as u64;
    let period = machine.cycle_period();
    assert_eq!(period, ms(len * 150 + 1000 + len * 100 + 1000));

    for offset in (0..period.as_millis() as u64).step_by(37) {
        assert_eq!(
            text_at(machine.clone(), ms(offset)),
            text_at(machine.clone(), ms(offset) + period),
            "offset {offset}ms"
        );
    }
}

#[test]
fn cycles_through_words_and_wraps() {
    let mut machine =
        TypewriterMachine::new(["HI", "YO"], TypewriterTiming::default()).expect("machine");
    let mut words_seen = Vec::new();
    for _ in 0..40 {
        if machine.fire() == Step::NextWord {
            words_seen.push(machine.state().current_word_index);
        }
    }
    assert_eq!(&words_seen[..4], &[1, 0, 1, 0]);
}

#[test]
fn counts_characters_not_bytes() {
    let mut machine = TypewriterMachine::new(["né"], TypewriterTiming::default()).expect("machine");
    machine.fire();
    machine.fire();
    assert_eq!(machine.text(), "né");
    assert_eq!(machine.state().char_index, 2);
}

#[test]
fn timing_comes_from_settings() {
    let settings = Settings {
        typing_speed_ms: 10,
        deleting_speed_ms: 5,
        pause_ms: 20,
        words: vec!["ABC".into()],
        ..Settings::default()
    };
    let machine = TypewriterMachine::from_settings(&settings).expect("machine");
    assert_eq!(machine.delay(), ms(10));
    assert_eq!(machine.cycle_period(), ms(3 * 10 + 3 * 5 + 2 * 20));
}

proptest! {
    #[test]
    fn char_index_stays_within_current_word(
        words in prop::collection::vec("[A-Za-z é]{1,12}", 1..4),
        fires in 0usize..400,
    ) {
        let mut machine = TypewriterMachine::new(&words, TypewriterTiming::default())
            .expect("machine");
        for _ in 0..fires {
            machine.fire();
            let state = machine.state();
            let word: Vec<char> = words[state.current_word_index].chars().collect();
            prop_assert!(state.char_index <= word.len());
            let prefix: String = word[..state.char_index].iter().collect();
            prop_assert_eq!(machine.text(), prefix);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn animator_publishes_typed_text_over_time() {
    let handle = TypewriterAnimator::start(headline_machine());
    assert_eq!(handle.text(), "");

    tokio::time::sleep(ms(151)).await;
    assert_eq!(handle.text(), "C");

    tokio::time::sleep(ms(150 * 10)).await;
    assert_eq!(handle.text(), HEADLINE);

    // Through the pause and two deletions.
    tokio::time::sleep(ms(1000 + 200)).await;
    assert_eq!(handle.text(), "COMING SO");
    handle.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_timer() {
    let handle = TypewriterAnimator::start(headline_machine());
    tokio::time::sleep(ms(451)).await;
    assert_eq!(handle.text(), "COM");

    let mut text = handle.subscribe();
    text.borrow_and_update();
    handle.stop();

    assert!(text.changed().await.is_err(), "animation task is gone");
    assert!(handle.is_stopped());

    tokio::time::sleep(ms(10_000)).await;
    assert_eq!(handle.text(), "COM");
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_animation() {
    let handle = TypewriterAnimator::start(headline_machine());
    let mut text = handle.subscribe();
    drop(handle);

    assert!(text.changed().await.is_err());
    assert_eq!(*text.borrow(), "");
}
