use tracing::debug;

/// A detected change of SIM identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimChange {
    pub previous: String,
    pub current: String,
}

/// Compares observed SIM identities against a seeded baseline. The
/// first observation never fires: it seeds the baseline instead.
#[derive(Debug, Default)]
pub struct SimChangeDetector {
    baseline: Option<String>,
}

impl SimChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector pre-seeded with a known identity, e.g. one read from
    /// the platform at monitor start.
    pub fn with_baseline(identity: Option<String>) -> Self {
        Self { baseline: identity }
    }

    /// Feeds a newly observed identity. Returns the change when the
    /// identity differs from the baseline, updating the baseline so a
    /// repeated report of the same SIM fires only once.
    pub fn observe(&mut self, identity: &str) -> Option<SimChange> {
        match self.baseline.as_deref() {
            None => {
                debug!(%identity, "Seeding SIM identity baseline");
                self.baseline = Some(identity.to_string());
                None
            }
            Some(known) if known == identity => None,
            Some(known) => {
                let change = SimChange {
                    previous: known.to_string(),
                    current: identity.to_string(),
                };
                self.baseline = Some(identity.to_string());
                Some(change)
            }
        }
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }
}
