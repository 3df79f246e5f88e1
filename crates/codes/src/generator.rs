use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::code::{Code, GROUP_RANGE, MAX_UNIQUE_CODES};
use crate::error::CodeError;
use crate::scanner::ExistingCodes;

pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;
pub const DEFAULT_WARN_MARGIN: usize = 1_000;

/// Supplies the numeric groups of candidate codes.
pub trait CodeSource {
    /// Returns a value in 100..=999.
    fn draw_group(&mut self) -> u16;
}

/// Uniform draws from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl RngSource<StdRng> {
    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CodeSource for RngSource<R> {
    fn draw_group(&mut self) -> u16 {
        self.rng.gen_range(GROUP_RANGE)
    }
}

/// Limits applied to a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorPolicy {
    pub max_codes: usize,
    /// Warn once the existing count is within this many of `max_codes`.
    pub warn_margin: usize,
    /// Consecutive collisions tolerated before giving up.
    ///
    /// Near capacity this bound can trip while free codes remain; it is a
    /// safety valve, not proof of exhaustion.
    pub max_attempts: usize,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            max_codes: MAX_UNIQUE_CODES,
            warn_margin: DEFAULT_WARN_MARGIN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Draws codes until one is absent from `existing`.
pub fn generate_unique<S>(
    existing: &ExistingCodes,
    source: &mut S,
    policy: &GeneratorPolicy,
) -> Result<Code, CodeError>
where
    S: CodeSource + ?Sized,
{
    let count = existing.len();
    if count >= policy.max_codes {
        return Err(CodeError::CapacityExhausted {
            existing: count,
            max: policy.max_codes,
        });
    }
    if count >= policy.max_codes.saturating_sub(policy.warn_margin) {
        warn!(
            used = count,
            max = policy.max_codes,
            "approaching the maximum number of unique codes"
        );
    }

    for attempt in 1..=policy.max_attempts {
        let candidate = Code::new(source.draw_group(), source.draw_group())?;
        if !existing.contains(&candidate) {
            debug!(code = %candidate, attempt, "drew unique code");
            return Ok(candidate);
        }
    }
    Err(CodeError::GenerationExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    struct Scripted(VecDeque<u16>);

    impl CodeSource for Scripted {
        fn draw_group(&mut self) -> u16 {
            self.0.pop_front().unwrap_or(999)
        }
    }

    struct Constant {
        value: u16,
        draws: usize,
    }

    impl CodeSource for Constant {
        fn draw_group(&mut self) -> u16 {
            self.draws += 1;
            self.value
        }
    }

    #[test]
    fn retries_after_collision() {
        let existing: ExistingCodes = ["fc-100-100"].into_iter().collect();
        let mut source = Scripted(VecDeque::from([100, 100, 100, 101]));
        let code = generate_unique(&existing, &mut source, &GeneratorPolicy::default()).unwrap();
        assert_eq!(code.to_string(), "fc-100-101");
        assert!(source.0.is_empty());
    }

    #[test]
    fn capacity_reached_fails_without_drawing() {
        let existing: ExistingCodes = ["fc-100-100", "fc-100-101"].into_iter().collect();
        let policy = GeneratorPolicy {
            max_codes: 2,
            ..GeneratorPolicy::default()
        };
        let mut source = Constant {
            value: 500,
            draws: 0,
        };
        let err = generate_unique(&existing, &mut source, &policy).unwrap_err();
        assert_eq!(
            err,
            CodeError::CapacityExhausted {
                existing: 2,
                max: 2
            }
        );
        assert_eq!(source.draws, 0);
    }

    #[test]
    fn full_address_space_is_capacity_exhausted() {
        let existing: ExistingCodes = GROUP_RANGE
            .flat_map(|left| GROUP_RANGE.map(move |right| format!("fc-{left}-{right}")))
            .collect();
        assert_eq!(existing.len(), MAX_UNIQUE_CODES);
        let mut source = Constant {
            value: 100,
            draws: 0,
        };
        let err =
            generate_unique(&existing, &mut source, &GeneratorPolicy::default()).unwrap_err();
        assert!(matches!(err, CodeError::CapacityExhausted { .. }));
        assert_eq!(source.draws, 0);
    }

    #[test]
    fn gives_up_after_bounded_collisions() {
        let existing: ExistingCodes = ["fc-100-100"].into_iter().collect();
        let mut source = Constant {
            value: 100,
            draws: 0,
        };
        let policy = GeneratorPolicy {
            max_attempts: 25,
            ..GeneratorPolicy::default()
        };
        let err = generate_unique(&existing, &mut source, &policy).unwrap_err();
        assert_eq!(err, CodeError::GenerationExhausted { attempts: 25 });
        assert_eq!(source.draws, 50);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs `f` under a subscriber that records WARN and above.
    fn warnings_during(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn filled(count: usize) -> ExistingCodes {
        (0..count).map(|i| format!("fc-100-{}", 100 + i)).collect()
    }

    #[test]
    fn warns_only_within_margin_of_capacity() {
        const WARNING: &str = "approaching the maximum number of unique codes";
        let policy = GeneratorPolicy {
            max_codes: 10,
            warn_margin: 3,
            ..GeneratorPolicy::default()
        };
        for (count, expected) in [(0, 0), (6, 0), (7, 1), (9, 1)] {
            let existing = filled(count);
            let logs = warnings_during(|| {
                let mut source = Scripted(VecDeque::from([500, 500]));
                generate_unique(&existing, &mut source, &policy).unwrap();
            });
            assert_eq!(logs.matches(WARNING).count(), expected, "count {count}: {logs}");
            if expected == 1 {
                assert!(logs.contains(&format!("used={count}")), "{logs}");
                assert!(logs.contains("max=10"), "{logs}");
            }
        }
    }

    #[test]
    fn capacity_error_is_not_preceded_by_a_warning() {
        let policy = GeneratorPolicy {
            max_codes: 3,
            warn_margin: 2,
            ..GeneratorPolicy::default()
        };
        let existing = filled(3);
        let logs = warnings_during(|| {
            let mut source = Scripted(VecDeque::new());
            assert!(generate_unique(&existing, &mut source, &policy).is_err());
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn near_capacity_still_generates() {
        let existing: ExistingCodes = ["fc-100-100"].into_iter().collect();
        let policy = GeneratorPolicy {
            max_codes: 2,
            warn_margin: 1,
            ..GeneratorPolicy::default()
        };
        let mut source = Scripted(VecDeque::from([100, 100, 100, 200]));
        let code = generate_unique(&existing, &mut source, &policy).unwrap();
        assert_eq!(code.to_string(), "fc-100-200");
    }

    #[test]
    fn random_codes_are_well_formed_and_unique() {
        let mut existing: ExistingCodes = (0..2_000)
            .map(|i| format!("fc-{}-{}", 100 + i % 900, 100 + i / 900))
            .collect();
        let mut source = RngSource::seeded(7);
        for _ in 0..500 {
            let code =
                generate_unique(&existing, &mut source, &GeneratorPolicy::default()).unwrap();
            assert!(GROUP_RANGE.contains(&code.left()));
            assert!(GROUP_RANGE.contains(&code.right()));
            assert_eq!(code.to_string().parse::<Code>().unwrap(), code);
            assert!(existing.insert(code), "{code} was already present");
        }
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        let left: Vec<u16> = (0..10).map(|_| a.draw_group()).collect();
        let right: Vec<u16> = (0..10).map(|_| b.draw_group()).collect();
        assert_eq!(left, right);
    }
}
