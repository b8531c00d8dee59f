use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

/// How many hints a game may use; enforced by the service, not the client.
pub const HINT_BUDGET: usize = 2;

/// Per-guess feedback: digits correct in place, and digits present elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub exact: usize,
    pub partial: usize,
}

impl Feedback {
    pub fn misses(&self, code_length: usize) -> usize {
        code_length.saturating_sub(self.exact + self.partial)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GuessReply {
    /// The service refused to score the guess; the row stays editable.
    Rejected { message: String },
    Scored {
        feedback: Feedback,
        over: bool,
        won: bool,
        /// Revealed only when the game is over.
        secret: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum HintReply {
    Revealed { position: usize, digit: char },
    Refused { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurrenderReply {
    pub secret: String,
}

/// A remote call the session asks the app to dispatch to the worker.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceRequest {
    Guess(String),
    Hint,
    Surrender,
}

/// A resolved remote call, delivered back to the session as an event.
/// `Err` means transport failure: the request is treated as never sent.
#[derive(Debug)]
pub enum ServiceReply {
    Guess(Result<GuessReply>),
    Hint(Result<HintReply>),
    Surrender(Result<SurrenderReply>),
}

/// The game service contract: scoring, hints, and surrender live behind it.
pub trait GameService: Send + 'static {
    fn submit_guess(&mut self, guess: &str) -> Result<GuessReply>;
    fn request_hint(&mut self) -> Result<HintReply>;
    fn surrender(&mut self) -> Result<SurrenderReply>;
}

/// Bulls-and-cows scoring. Tolerates length mismatches so a malformed guess
/// can never panic the scorer; validation happens before scoring anyway.
pub fn score(secret: &str, guess: &str) -> Feedback {
    let s: Vec<char> = secret.chars().collect();
    let g: Vec<char> = guess.chars().collect();
    let safe_len = s.len().min(g.len());

    let mut exact = 0;
    let mut secret_rest = Vec::new();
    let mut guess_rest = Vec::new();
    for i in 0..safe_len {
        if g[i] == s[i] {
            exact += 1;
        } else {
            secret_rest.push(s[i]);
            guess_rest.push(g[i]);
        }
    }
    secret_rest.extend_from_slice(&s[safe_len..]);
    guess_rest.extend_from_slice(&g[safe_len..]);

    let mut partial = 0;
    for digit in guess_rest {
        if let Some(pos) = secret_rest.iter().position(|&c| c == digit) {
            partial += 1;
            secret_rest.remove(pos);
        }
    }

    Feedback { exact, partial }
}

fn validate(guess: &str, length: usize) -> Option<String> {
    if guess.is_empty() || !guess.chars().all(|c| c.is_ascii_digit()) {
        Some("Input must be numbers only.".to_string())
    } else if guess.chars().count() != length {
        Some(format!("Input must be exactly {length} digits."))
    } else {
        None
    }
}

fn generate_secret<R: Rng>(length: usize, allow_repeats: bool, rng: &mut R) -> String {
    if allow_repeats {
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10)))
            .collect()
    } else {
        let mut digits: Vec<char> = ('0'..='9').collect();
        digits.shuffle(rng);
        digits[..length.min(digits.len())].iter().collect()
    }
}

/// In-process game service: same contract as the HTTP server, playable
/// offline and deterministic under test via [`LocalService::with_secret`].
#[derive(Debug)]
pub struct LocalService {
    secret: String,
    max_attempts: usize,
    attempts: usize,
    revealed: Vec<usize>,
}

impl LocalService {
    pub fn new(code_length: usize, allow_repeats: bool, max_attempts: usize) -> Self {
        let secret = generate_secret(code_length, allow_repeats, &mut rand::thread_rng());
        Self::with_secret(&secret, max_attempts)
    }

    pub fn with_secret(secret: &str, max_attempts: usize) -> Self {
        Self {
            secret: secret.to_string(),
            max_attempts,
            attempts: 0,
            revealed: Vec::new(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl GameService for LocalService {
    fn submit_guess(&mut self, guess: &str) -> Result<GuessReply> {
        if let Some(message) = validate(guess, self.secret.chars().count()) {
            return Ok(GuessReply::Rejected { message });
        }

        let feedback = score(&self.secret, guess);
        self.attempts += 1;

        let won = feedback.exact == self.secret.chars().count();
        let lost = self.attempts >= self.max_attempts && !won;
        let over = won || lost;

        Ok(GuessReply::Scored {
            feedback,
            over,
            won,
            secret: over.then(|| self.secret.clone()),
        })
    }

    fn request_hint(&mut self) -> Result<HintReply> {
        if self.revealed.len() >= HINT_BUDGET {
            return Ok(HintReply::Refused {
                message: "No hints remaining! You are on your own.".to_string(),
            });
        }

        let available: Vec<usize> = (0..self.secret.chars().count())
            .filter(|i| !self.revealed.contains(i))
            .collect();
        match available.choose(&mut rand::thread_rng()) {
            Some(&position) => {
                self.revealed.push(position);
                let digit = self
                    .secret
                    .chars()
                    .nth(position)
                    .context("hint position out of range")?;
                Ok(HintReply::Revealed { position, digit })
            }
            None => Ok(HintReply::Refused {
                message: "All numbers revealed!".to_string(),
            }),
        }
    }

    fn surrender(&mut self) -> Result<SurrenderReply> {
        Ok(SurrenderReply {
            secret: self.secret.clone(),
        })
    }
}

// --- HTTP client against the original CodeBreaker server ---

#[derive(Deserialize)]
struct WireScore {
    bulls: usize,
    cows: usize,
}

#[derive(Deserialize)]
struct WireGuess {
    valid: Option<bool>,
    message: Option<String>,
    result: Option<WireScore>,
    game_over: Option<bool>,
    won: Option<bool>,
    secret_code: Option<String>,
}

#[derive(Deserialize)]
struct WireHint {
    index: Option<usize>,
    number: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct WireSurrender {
    secret_code: String,
}

/// Game service backed by the CodeBreaker HTTP API. The server keeps game
/// state in a cookie session, so one client instance is one game.
pub struct HttpService {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpService {
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Ask the server to start a fresh game with the given parameters.
    pub fn start_game(
        &self,
        length: usize,
        allow_repeats: bool,
        max_attempts: usize,
        timer_secs: u64,
        mode: &str,
    ) -> Result<()> {
        self.client
            .post(format!("{}/api/new_game", self.base))
            .json(&serde_json::json!({
                "length": length,
                "repeats": allow_repeats,
                "max_attempts": max_attempts,
                "timer": timer_secs,
                "mode": mode,
            }))
            .send()
            .context("new_game request failed")?
            .error_for_status()
            .context("new_game rejected by server")?;
        Ok(())
    }
}

impl GameService for HttpService {
    fn submit_guess(&mut self, guess: &str) -> Result<GuessReply> {
        let reply: WireGuess = self
            .client
            .post(format!("{}/api/guess", self.base))
            .json(&serde_json::json!({ "guess": guess }))
            .send()
            .context("guess request failed")?
            .error_for_status()
            .context("guess rejected by server")?
            .json()
            .context("malformed guess response")?;

        if reply.valid == Some(true) {
            let result = reply.result.context("guess response missing result")?;
            Ok(GuessReply::Scored {
                feedback: Feedback {
                    exact: result.bulls,
                    partial: result.cows,
                },
                over: reply.game_over.unwrap_or(false),
                won: reply.won.unwrap_or(false),
                secret: reply.secret_code,
            })
        } else {
            Ok(GuessReply::Rejected {
                message: reply
                    .message
                    .unwrap_or_else(|| "Guess rejected.".to_string()),
            })
        }
    }

    fn request_hint(&mut self) -> Result<HintReply> {
        let reply: WireHint = self
            .client
            .post(format!("{}/api/hint", self.base))
            .send()
            .context("hint request failed")?
            .error_for_status()
            .context("hint rejected by server")?
            .json()
            .context("malformed hint response")?;

        match (reply.index, reply.number) {
            (Some(position), Some(number)) => {
                let digit = number.chars().next().context("empty hint digit")?;
                Ok(HintReply::Revealed { position, digit })
            }
            _ => Ok(HintReply::Refused {
                message: reply
                    .message
                    .unwrap_or_else(|| "No hint available.".to_string()),
            }),
        }
    }

    fn surrender(&mut self) -> Result<SurrenderReply> {
        let reply: WireSurrender = self
            .client
            .post(format!("{}/api/surrender", self.base))
            .send()
            .context("surrender request failed")?
            .error_for_status()
            .context("surrender rejected by server")?
            .json()
            .context("malformed surrender response")?;

        Ok(SurrenderReply {
            secret: reply.secret_code,
        })
    }
}
