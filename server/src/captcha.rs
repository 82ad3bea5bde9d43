use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

//--------------------------------------------------------------------------------------------------
// Login captcha challenges
//--------------------------------------------------------------------------------------------------

const CHALLENGE_TTL: Duration = Duration::from_secs(300);
const CODE_LENGTH: usize = 4;

struct Challenge {
    answer: String,
    expires_at: Instant,
}

/// In-process, single-use challenge store. The generated blob is base64 so an image renderer can
/// be slotted in without changing the wire contract.
pub struct CaptchaStore {
    challenges: Mutex<HashMap<String, Challenge>>,
    ttl: Duration,
}

impl Default for CaptchaStore {
    fn default() -> Self {
        CaptchaStore {
            challenges: Mutex::new(HashMap::new()),
            ttl: CHALLENGE_TTL,
        }
    }
}

impl CaptchaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self) -> (String, String) {
        let mut rng = rand::thread_rng();
        let answer: String = (0..CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10)))
            .collect();

        let id = uuid::Uuid::new_v4().to_string();
        let blob = BASE64.encode(answer.as_bytes());

        let mut challenges = self.challenges.lock();

        // Abandoned challenges go away here rather than via a background task
        let now = Instant::now();
        challenges.retain(|_, challenge| challenge.expires_at > now);

        challenges.insert(
            id.clone(),
            Challenge {
                answer,
                expires_at: now + self.ttl,
            },
        );

        debug!("Generated captcha challenge {}", id);

        (id, blob)
    }

    // One shot: the challenge is consumed whether or not the answer matches
    pub fn verify(&self, id: &str, answer: &str) -> bool {
        match self.challenges.lock().remove(id) {
            Some(challenge) if challenge.expires_at > Instant::now() => challenge.answer == answer,
            _ => false,
        }
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_ttl(ttl: Duration) -> CaptchaStore {
        CaptchaStore {
            challenges: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn answer_for(store: &CaptchaStore, id: &str) -> String {
        store.challenges.lock()[id].answer.clone()
    }

    #[test]
    fn correct_answer_verifies_once() {
        let store = CaptchaStore::new();

        let (id, _blob) = store.generate();
        let answer = answer_for(&store, &id);

        assert!(store.verify(&id, &answer));
        // Consumed
        assert!(!store.verify(&id, &answer));
    }

    #[test]
    fn wrong_answer_fails_and_consumes() {
        let store = CaptchaStore::new();

        let (id, _blob) = store.generate();
        let answer = answer_for(&store, &id);
        let wrong = if answer == "0000" { "1111" } else { "0000" };

        assert!(!store.verify(&id, wrong));
        // The failed attempt consumed the challenge
        assert!(!store.verify(&id, &answer));
    }

    #[test]
    fn unknown_id_fails() {
        let store = CaptchaStore::new();

        assert!(!store.verify("no-such-id", "1234"));
    }

    #[test]
    fn expired_challenge_fails() {
        let store = store_with_ttl(Duration::from_millis(10));

        let (id, _blob) = store.generate();
        let answer = answer_for(&store, &id);

        std::thread::sleep(Duration::from_millis(30));

        assert!(!store.verify(&id, &answer));
    }

    #[test]
    fn blob_is_base64_of_the_answer() {
        let store = CaptchaStore::new();

        let (id, blob) = store.generate();
        let answer = answer_for(&store, &id);

        assert_eq!(BASE64.decode(blob).unwrap(), answer.as_bytes());
    }
}
