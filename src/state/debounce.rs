use std::time::Duration;

/// Quiet period before the live preview re-renders after typing.
pub const PREVIEW_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// Generation counter for trailing-edge debouncing.
///
/// Every edit takes a new ticket. Whoever waits out the quiet period with a
/// ticket only acts if that ticket is still the newest one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    generation: u64,
    quiet: Duration,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            generation: 0,
            quiet,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn touch(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.generation
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(PREVIEW_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut d = Debouncer::default();
        let first = d.touch();
        let second = d.touch();
        assert!(!d.is_current(first));
        assert!(d.is_current(second));
    }

    #[tokio::test]
    async fn test_burst_of_edits_renders_once() {
        let mut d = Debouncer::new(Duration::from_millis(100));
        let mut tickets = Vec::new();
        for _ in 0..5 {
            tickets.push(d.touch());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(d.quiet()).await;

        let fired: Vec<_> = tickets.iter().filter(|t| d.is_current(**t)).collect();
        assert_eq!(fired, vec![tickets.last().unwrap()]);
    }
}
