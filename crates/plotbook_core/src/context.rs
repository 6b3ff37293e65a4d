//! Clock and id injection for document mutations and migrations.
//!
//! # Responsibility
//! - Provide the only source of "now" and fresh ids to engine code.
//! - Allow tests to pin both for deterministic output.
//!
//! # Invariants
//! - Engine functions never read the system clock or an RNG directly.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use uuid::Uuid;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of fresh record ids.
pub trait IdGenerator {
    /// Returns a new id of the form `<prefix>-<suffix>`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// UUIDv4-backed ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

/// Counter-backed ids (`area-1`, `planting-2`, ...), shared across prefixes.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    issued: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.issued += 1;
        format!("{prefix}-{}", self.issued)
    }
}

/// Clock + id source handed to every operation that stamps or creates.
pub struct EngineContext {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl EngineContext {
    pub fn new(clock: Box<dyn Clock>, ids: Box<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Wall clock and random ids.
    pub fn system() -> Self {
        Self::new(Box::new(SystemClock), Box::new(RandomIds))
    }

    /// Fixed clock and sequential ids.
    pub fn deterministic(at: DateTime<Utc>) -> Self {
        Self::new(Box::new(FixedClock(at)), Box::new(SequentialIds::default()))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// RFC 3339 timestamp with millisecond precision and `Z` suffix.
    pub fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// `YYYY-MM-DD` of the current instant.
    pub fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }

    pub fn current_year(&self) -> i32 {
        self.now().year()
    }

    pub fn next_id(&mut self, prefix: &str) -> String {
        self.ids.next_id(prefix)
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::EngineContext;
    use chrono::{DateTime, Utc};

    #[test]
    fn deterministic_context_is_stable() {
        let at: DateTime<Utc> = "2025-03-01T10:00:00Z".parse().unwrap();
        let mut ctx = EngineContext::deterministic(at);

        assert_eq!(ctx.timestamp(), "2025-03-01T10:00:00.000Z");
        assert_eq!(ctx.today(), "2025-03-01");
        assert_eq!(ctx.current_year(), 2025);
        assert_eq!(ctx.next_id("area"), "area-1");
        assert_eq!(ctx.next_id("planting"), "planting-2");
    }

    #[test]
    fn random_ids_carry_prefix_and_differ() {
        let mut ctx = EngineContext::system();
        let first = ctx.next_id("note");
        let second = ctx.next_id("note");
        assert!(first.starts_with("note-"));
        assert_ne!(first, second);
    }
}
