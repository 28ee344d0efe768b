// src/generator.rs

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// How many filler candidates we are willing to draw before giving up on a
/// distractor pool. The ±10 window around a numeric answer holds plenty of
/// distinct values, so hitting this bound means something is deeply wrong.
const MAX_FILL_ATTEMPTS: u32 = 100;

/// Exam difficulty tiers.
///
/// Parsing is deliberately forgiving: any unrecognized label degrades to
/// `Easy` instead of erroring, so callers can pass difficulty strings
/// straight through from requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Case-insensitive parse with a silent `Easy` fallback.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            "expert" => Difficulty::Expert,
            _ => Difficulty::Easy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// Errors from question synthesis.
#[derive(Debug)]
pub enum GenerateError {
    /// The distractor pool could not be filled with three distinct wrong
    /// answers within the attempt budget.
    DistractorPool { correct: String },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::DistractorPool { correct } => {
                write!(f, "could not build a distractor pool for answer '{}'", correct)
            }
        }
    }
}

impl std::error::Error for GenerateError {}

/// A fully assembled multiple-choice question, ready to persist.
///
/// Exactly one option slot holds the computed correct value, and `answer`
/// names that slot.
#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Correct option letter: 'A'..'D'.
    pub answer: char,
}

/// A question before shuffling: the text, the correct value, and the raw
/// (possibly colliding) distractor candidates from the tier builder.
#[derive(Debug, Clone)]
struct RawQuestion {
    text: String,
    correct: String,
    distractors: Vec<String>,
}

impl RawQuestion {
    fn numeric(text: String, correct: i64, distractors: Vec<i64>) -> Self {
        Self {
            text,
            correct: correct.to_string(),
            distractors: distractors.iter().map(i64::to_string).collect(),
        }
    }
}

/// Math question generator over an injectable randomness source.
///
/// The RNG is a constructor argument rather than process-global state so
/// tests can seed it and concurrent callers get their own instance.
pub struct MathGenerator<R = StdRng> {
    rng: R,
}

impl MathGenerator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for MathGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MathGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Produces `count` questions at the given tier. Position `i` of the
    /// output is the `i`-th question generated; each question's content is
    /// independently randomized.
    pub fn generate(
        &mut self,
        difficulty: Difficulty,
        count: u32,
    ) -> Result<Vec<GeneratedQuestion>, GenerateError> {
        let mut questions = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let raw = match difficulty {
                Difficulty::Easy => self.easy_question(),
                Difficulty::Medium => self.medium_question(),
                Difficulty::Hard => self.hard_question(),
                Difficulty::Expert => self.expert_question(),
            };
            questions.push(self.assemble(raw)?);
        }

        Ok(questions)
    }

    /// Addition, subtraction or multiplication of two small integers.
    fn easy_question(&mut self) -> RawQuestion {
        let (text, correct) = match self.rng.gen_range(0..3) {
            0 => addition(self.rng.gen_range(1..50), self.rng.gen_range(1..50)),
            1 => subtraction(self.rng.gen_range(1..50), self.rng.gen_range(1..50)),
            // Multiplication draws from a smaller range to keep products small.
            _ => multiplication(self.rng.gen_range(2..15), self.rng.gen_range(2..15)),
        };

        let distractors = vec![
            correct + self.rng.gen_range(1..5),
            correct - self.rng.gen_range(1..5),
            correct + self.rng.gen_range(5..15),
        ];

        RawQuestion::numeric(text, correct, distractors)
    }

    /// Linear equation solved for x, or a percentage-of-total problem.
    fn medium_question(&mut self) -> RawQuestion {
        if self.rng.gen_range(0..2) == 0 {
            let a = self.rng.gen_range(2..10);
            let x = self.rng.gen_range(1..20);
            let b = self.rng.gen_range(1..20);
            let c = a * x + b;
            let (text, correct) = linear_equation(a, x, b);

            let distractors = vec![
                correct + self.rng.gen_range(1..5),
                correct - self.rng.gen_range(1..5),
                // Classic slip: dividing by the wrong coefficient.
                (c - b) / (a + 1),
            ];

            RawQuestion::numeric(text, correct, distractors)
        } else {
            let total = self.rng.gen_range(50..200);
            let percent = self.rng.gen_range(10..50) * 5;
            let (text, correct) = percent_of(total, percent);

            let distractors = vec![
                correct + self.rng.gen_range(5..15),
                correct - self.rng.gen_range(5..15),
                // Classic slip: subtracting from the total instead.
                total - correct,
            ];

            RawQuestion::numeric(text, correct, distractors)
        }
    }

    /// Quadratic with two small positive roots, or a mixed-operator
    /// expression testing precedence.
    fn hard_question(&mut self) -> RawQuestion {
        if self.rng.gen_range(0..2) == 0 {
            quadratic(self.rng.gen_range(2..8), self.rng.gen_range(2..8))
        } else {
            mixed_expression(
                self.rng.gen_range(2..10),
                self.rng.gen_range(2..10),
                self.rng.gen_range(2..5),
            )
        }
    }

    /// Power-rule differentiation of a*x^n.
    fn expert_question(&mut self) -> RawQuestion {
        power_rule(self.rng.gen_range(2..10), self.rng.gen_range(2..6))
    }

    /// Completes the distractor pool and shuffles the four values into
    /// lettered option slots.
    fn assemble(&mut self, raw: RawQuestion) -> Result<GeneratedQuestion, GenerateError> {
        let distractors = self.complete_distractors(&raw.correct, raw.distractors)?;

        let mut slots = vec![raw.correct.clone()];
        slots.extend(distractors);
        // Uniform permutation; `shuffle` is Fisher-Yates under the hood.
        slots.shuffle(&mut self.rng);

        // The correct value was just inserted and distractors never equal it.
        let answer_idx = slots
            .iter()
            .position(|s| *s == raw.correct)
            .unwrap_or_default();
        let answer = char::from(b'A' + answer_idx as u8);

        tracing::debug!(question = %raw.text, %answer, "assembled question");

        let mut slots = slots.into_iter();
        Ok(GeneratedQuestion {
            text: raw.text,
            option_a: slots.next().unwrap_or_default(),
            option_b: slots.next().unwrap_or_default(),
            option_c: slots.next().unwrap_or_default(),
            option_d: slots.next().unwrap_or_default(),
            answer,
        })
    }

    /// Reduces the raw candidates to exactly three distinct wrong answers,
    /// synthesizing `correct ± offset` fillers when the tier builder came
    /// up short (duplicate roots, colliding offsets).
    fn complete_distractors(
        &mut self,
        correct: &str,
        candidates: Vec<String>,
    ) -> Result<Vec<String>, GenerateError> {
        let mut pool: Vec<String> = Vec::with_capacity(3);
        for candidate in candidates {
            if candidate != correct && !pool.contains(&candidate) {
                pool.push(candidate);
            }
        }
        pool.truncate(3);

        if pool.len() < 3 {
            // Fillers need a numeric answer to offset from.
            let base: i64 = correct.parse().map_err(|_| GenerateError::DistractorPool {
                correct: correct.to_string(),
            })?;

            let mut attempts = 0;
            while pool.len() < 3 {
                attempts += 1;
                if attempts > MAX_FILL_ATTEMPTS {
                    return Err(GenerateError::DistractorPool {
                        correct: correct.to_string(),
                    });
                }
                let candidate = (base + self.rng.gen_range(-10..10)).to_string();
                if candidate != correct && !pool.contains(&candidate) {
                    pool.push(candidate);
                }
            }
        }

        Ok(pool)
    }
}

fn addition(a: i64, b: i64) -> (String, i64) {
    (format!("What is {} + {}?", a, b), a + b)
}

/// Operands are swapped when needed so the result is never negative.
fn subtraction(a: i64, b: i64) -> (String, i64) {
    let (hi, lo) = if a < b { (b, a) } else { (a, b) };
    (format!("What is {} - {}?", hi, lo), hi - lo)
}

fn multiplication(a: i64, b: i64) -> (String, i64) {
    (format!("What is {} × {}?", a, b), a * b)
}

fn linear_equation(a: i64, x: i64, b: i64) -> (String, i64) {
    let c = a * x + b;
    (format!("Solve for x: {}x + {} = {}", a, b, c), x)
}

fn percent_of(total: i64, percent: i64) -> (String, i64) {
    let result = (total * percent) / 100;
    (format!("What is {}% of {}?", percent, total), result)
}

/// x^2 - (r1+r2)x + r1*r2 = 0; the answer is the larger root. With equal
/// roots the smaller-root distractor collides with the answer and pool
/// completion replaces it.
fn quadratic(r1: i64, r2: i64) -> RawQuestion {
    let sum = r1 + r2;
    let product = r1 * r2;
    let correct = r1.max(r2);

    let text = format!("Find the positive solution for x^2 - {}x + {} = 0", sum, product);
    let distractors = vec![r1.min(r2), correct + 1, sum];

    RawQuestion::numeric(text, correct, distractors)
}

fn mixed_expression(a: i64, b: i64, c: i64) -> RawQuestion {
    let correct = a * b + c * 2;
    let text = format!("Calculate: ({} × {}) + ({} × 2)", a, b, c);

    let distractors = vec![
        (a + b) * c * 2, // added before multiplying
        a * (b + c) * 2, // wrong grouping
        a * b + c,       // dropped the second product
    ];

    RawQuestion::numeric(text, correct, distractors)
}

/// f(x) = a*x^n, f'(x) = (a*n)*x^(n-1). The three distractors are the
/// classic mistakes, each distinct from the answer for every a >= 2, n >= 2.
fn power_rule(coefficient: i64, exponent: i64) -> RawQuestion {
    let text = format!(
        "Find the derivative of f(x) = {}",
        render_term(coefficient, exponent)
    );
    let correct = render_term(coefficient * exponent, exponent - 1);

    let distractors = vec![
        // Forgot to multiply the coefficient by the exponent.
        render_term(coefficient, exponent - 1),
        // Forgot to reduce the exponent.
        render_term(coefficient * exponent, exponent),
        // Integrated instead of differentiated.
        render_term(coefficient, exponent + 1),
    ];

    RawQuestion {
        text,
        correct,
        distractors,
    }
}

/// Renders `c*x^e`: exponent 0 collapses to the bare coefficient and
/// exponent 1 drops the caret.
fn render_term(coefficient: i64, exponent: i64) -> String {
    match exponent {
        0 => coefficient.to_string(),
        1 => format!("{}x", coefficient),
        _ => format!("{}x^{}", coefficient, exponent),
    }
}
