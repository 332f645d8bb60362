//! Prometheus counters for policy decisions.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use domains::AppError;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Action {
    CreateAccount,
    CreateDonation,
    EditDonation,
    DeleteDonation,
    ReportDonation,
    BanUser,
    DeleteSelf,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Allowed,
    Denied,
    Rejected,
    Error,
}

impl Outcome {
    pub fn of<T>(result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => Outcome::Allowed,
            Err(AppError::Forbidden(_)) => Outcome::Denied,
            Err(AppError::Integrity(_)) | Err(AppError::Internal(_)) => Outcome::Error,
            Err(_) => Outcome::Rejected,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DecisionLabels {
    pub action: Action,
    pub outcome: Outcome,
}

pub struct Metrics {
    registry: Registry,
    decisions: Family<DecisionLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let decisions = Family::<DecisionLabels, Counter>::default();
        registry.register(
            "relief_policy_decisions",
            "Mutating requests by action and policy outcome",
            decisions.clone(),
        );
        Self {
            registry,
            decisions,
        }
    }

    pub fn observe<T>(&self, action: Action, result: &Result<T, AppError>) {
        self.decisions
            .get_or_create(&DecisionLabels {
                action,
                outcome: Outcome::of(result),
            })
            .inc();
    }

    pub fn count(&self, action: Action, outcome: Outcome) -> u64 {
        self.decisions
            .get_or_create(&DecisionLabels { action, outcome })
            .get()
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use domains::Denial;

    use super::*;

    #[test]
    fn test_outcomes_are_counted_per_label() {
        let metrics = Metrics::new();
        metrics.observe(Action::BanUser, &Ok::<(), AppError>(()));
        metrics.observe::<()>(Action::BanUser, &Err(AppError::Forbidden(Denial::NotAdmin)));
        metrics.observe::<()>(Action::BanUser, &Err(AppError::Forbidden(Denial::TargetIsAdmin)));

        assert_eq!(metrics.count(Action::BanUser, Outcome::Allowed), 1);
        assert_eq!(metrics.count(Action::BanUser, Outcome::Denied), 2);
        assert_eq!(metrics.count(Action::DeleteSelf, Outcome::Denied), 0);
    }

    #[test]
    fn test_render_uses_total_suffix() {
        let metrics = Metrics::new();
        metrics.observe::<()>(Action::CreateDonation, &Err(AppError::Internal("db".into())));
        let text = metrics.render().unwrap();
        assert!(text.contains("relief_policy_decisions_total"));
        assert!(text.contains("outcome=\"Error\""));
    }
}
