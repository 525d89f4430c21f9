use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const START_HEARTS: u8 = 3;
pub const QUESTION_SECONDS: u32 = 20;
pub const MONSTER_MAX_HP: u32 = 100;
/// Seconds knocked off the clock by a wrong answer
pub const WRONG_PENALTY_SECONDS: u32 = 5;
/// Clock reading at or below which the timer is shown as urgent
pub const LOW_TIME_SECONDS: u32 = 5;

const BASE_DAMAGE: u32 = 25;
const COMBO_DAMAGE: u32 = 5;
const BASE_POINTS: u32 = 100;

const FEEDBACK_DURATION: Duration = Duration::from_millis(1500);
const VICTORY_DELAY: Duration = Duration::from_millis(500);
const ONE_SECOND: Duration = Duration::from_secs(1);

/// A multiple-choice punctuation question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    pub explanation: String,
}

impl Question {
    fn new(question: &str, options: [&str; 3], correct_answer: usize, explanation: &str) -> Self {
        Self {
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            explanation: explanation.to_string(),
        }
    }
}

/// One line of the intro conversation
#[derive(Debug, Clone, Copy)]
pub struct DialogueLine {
    pub speaker: &'static str,
    pub text: &'static str,
}

pub const DIALOGUE: [DialogueLine; 3] = [
    DialogueLine {
        speaker: "Grammar Wizard",
        text: "Welcome to VocabVenture! Your mission is to defeat the Commawidow using your grammar skills!",
    },
    DialogueLine {
        speaker: "Word Warrior",
        text: "I'm ready! My punctuation sword is sharp and my vocabulary shield is strong!",
    },
    DialogueLine {
        speaker: "Commawidow",
        text: "Mwahaha! I'll spin a web of confusing sentences! Let's see if you can punctuate properly!",
    },
];

/// The stock four-question bank
pub fn builtin_questions() -> Vec<Question> {
    vec![
        Question::new(
            "Which sentence uses commas correctly?",
            [
                "I need eggs milk bread and cheese.",
                "I need eggs, milk, bread, and cheese.",
                "I need eggs milk, bread and, cheese.",
            ],
            1,
            "Commas should separate items in a list, with an optional comma before 'and' (Oxford comma).",
        ),
        Question::new(
            "Choose the correctly punctuated sentence:",
            [
                "Wow what an amazing game.",
                "Wow, what an amazing game!",
                "Wow what, an amazing game?",
            ],
            1,
            "Use a comma after interjections and an exclamation mark for excitement.",
        ),
        Question::new(
            "Which sentence needs a question mark?",
            [
                "Grammar is so much fun.",
                "Do you love grammar games.",
                "What a challenging puzzle.",
            ],
            1,
            "Sentences that ask direct questions should end with a question mark.",
        ),
        Question::new(
            "Identify the sentence with correct apostrophe use:",
            [
                "The students books are on the table.",
                "The student's books are on the table.",
                "The students' book's are on the table.",
            ],
            1,
            "Use 's to show possession for singular nouns.",
        ),
    ]
}

/// Load and validate a JSON question bank
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&content)?;
    validate_questions(&questions)?;
    Ok(questions)
}

fn validate_questions(questions: &[Question]) -> Result<()> {
    if questions.is_empty() {
        return Err(Error::InvalidQuestionBank("no questions".to_string()));
    }
    for (i, q) in questions.iter().enumerate() {
        if q.options.len() < 2 || q.options.len() > 9 {
            return Err(Error::InvalidQuestionBank(format!(
                "question {} needs between 2 and 9 options",
                i + 1
            )));
        }
        if q.correct_answer >= q.options.len() {
            return Err(Error::InvalidQuestionBank(format!(
                "question {} has correct_answer {} but only {} options",
                i + 1,
                q.correct_answer,
                q.options.len()
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Intro conversation, showing `DIALOGUE[n]`
    Dialogue(usize),
    Battle,
    Victory,
    GameOver,
}

/// Result of the last answer, shown until it expires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub selected: usize,
    pub correct: bool,
    remaining: Duration,
}

/// Grammar quiz battle against the Commawidow
#[derive(Debug, Clone)]
pub struct QuizBattle {
    questions: Vec<Question>,
    pub phase: Phase,
    pub hearts: u8,
    /// Seconds left on the current question
    pub time_left: u32,
    pub monster_hp: u32,
    pub question_index: usize,
    pub combo: u32,
    pub score: u32,
    pub feedback: Option<Feedback>,
    /// Time accumulated toward the next clock tick
    clock: Duration,
    /// Countdown to the victory screen once the monster is down
    victory_in: Option<Duration>,
}

impl QuizBattle {
    /// New game starting at the intro conversation
    pub fn new(questions: Vec<Question>) -> Self {
        let questions = if questions.is_empty() { builtin_questions() } else { questions };
        Self {
            questions,
            phase: Phase::Dialogue(0),
            hearts: START_HEARTS,
            time_left: QUESTION_SECONDS,
            monster_hp: MONSTER_MAX_HP,
            question_index: 0,
            combo: 0,
            score: 0,
            feedback: None,
            clock: Duration::ZERO,
            victory_in: None,
        }
    }

    pub fn question(&self) -> &Question {
        &self.questions[self.question_index]
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn dialogue_line(&self) -> Option<&'static DialogueLine> {
        match self.phase {
            Phase::Dialogue(i) => DIALOGUE.get(i),
            _ => None,
        }
    }

    pub fn time_is_low(&self) -> bool {
        self.phase == Phase::Battle && self.time_left <= LOW_TIME_SECONDS
    }

    /// Monster health as a 0.0-1.0 ratio
    pub fn monster_health(&self) -> f64 {
        self.monster_hp as f64 / MONSTER_MAX_HP as f64
    }

    fn accepting_answers(&self) -> bool {
        self.phase == Phase::Battle && self.feedback.is_none() && self.victory_in.is_none()
    }

    /// Move the intro conversation along; the last line starts the battle
    pub fn advance(&mut self) {
        if let Phase::Dialogue(i) = self.phase {
            if i + 1 < DIALOGUE.len() {
                self.phase = Phase::Dialogue(i + 1);
            } else {
                self.enter_battle();
            }
        }
    }

    /// Jump straight to the battle
    pub fn skip_intro(&mut self) {
        if matches!(self.phase, Phase::Dialogue(_)) {
            self.enter_battle();
        }
    }

    fn enter_battle(&mut self) {
        self.phase = Phase::Battle;
        self.clock = Duration::ZERO;
        log::info!("Quiz battle started");
    }

    /// Answer the current question.
    ///
    /// Returns `Some(correct)` when the answer was taken, `None` when answers
    /// are not being accepted (wrong phase, feedback still showing, or an
    /// option index that doesn't exist).
    pub fn answer(&mut self, option: usize) -> Option<bool> {
        if !self.accepting_answers() || option >= self.question().options.len() {
            return None;
        }

        let correct = option == self.question().correct_answer;
        if correct {
            self.combo += 1;
            self.score += BASE_POINTS * self.combo;
            let damage = BASE_DAMAGE + self.combo * COMBO_DAMAGE;
            self.monster_hp = self.monster_hp.saturating_sub(damage);
            if self.monster_hp == 0 {
                self.victory_in = Some(VICTORY_DELAY);
            }
        } else {
            self.combo = 0;
            self.time_left = self.time_left.saturating_sub(WRONG_PENALTY_SECONDS);
        }

        self.feedback = Some(Feedback {
            selected: option,
            correct,
            remaining: FEEDBACK_DURATION,
        });

        if !correct && self.time_left == 0 {
            self.time_out();
        }

        Some(correct)
    }

    /// Advance timers by `elapsed` wall time
    pub fn tick(&mut self, elapsed: Duration) {
        if self.phase != Phase::Battle {
            return;
        }

        if let Some(left) = self.victory_in {
            if elapsed >= left {
                self.victory_in = None;
                self.feedback = None;
                self.phase = Phase::Victory;
                log::info!("Quiz won with score {}", self.score);
            } else {
                self.victory_in = Some(left - elapsed);
            }
            // Clock stops once the monster is down
            return;
        }

        self.clock += elapsed;
        while self.clock >= ONE_SECOND && self.phase == Phase::Battle {
            self.clock -= ONE_SECOND;
            self.time_left = self.time_left.saturating_sub(1);
            if self.time_left == 0 {
                self.time_out();
            }
        }

        // Moving to the next question resets the clock, so it runs last
        if let Some(mut feedback) = self.feedback {
            if elapsed >= feedback.remaining {
                self.feedback = None;
                if feedback.correct {
                    self.next_question();
                }
            } else {
                feedback.remaining -= elapsed;
                self.feedback = Some(feedback);
            }
        }
    }

    fn next_question(&mut self) {
        // The bank wraps so a long game never runs out of questions
        self.question_index = (self.question_index + 1) % self.questions.len();
        self.time_left = QUESTION_SECONDS;
        self.clock = Duration::ZERO;
    }

    fn time_out(&mut self) {
        if self.hearts > 1 {
            self.hearts -= 1;
            self.time_left = QUESTION_SECONDS;
            self.combo = 0;
            log::debug!("Quiz timer ran out, {} hearts left", self.hearts);
        } else {
            self.hearts = 0;
            self.feedback = None;
            self.phase = Phase::GameOver;
            log::info!("Quiz lost with score {}", self.score);
        }
    }

    /// Fresh battle (the intro is not replayed)
    pub fn restart(&mut self) {
        let questions = std::mem::take(&mut self.questions);
        *self = Self::new(questions);
        self.enter_battle();
    }
}
