//! Family-level value and openness scoring.

use crate::analysis::family::group_by_family;
use crate::config::FamilyScoringConfig;
use crate::models::{FamilyGroup, FamilyScoreResult, FundRecord, MoneyTier, OpennessTier};
use crate::scoring::tiers::{points_at_least, points_below, tier_for};

/// Window totals across the funds of one family.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FamilyTotals {
    pub funds: usize,
    pub total_filings: u64,
    pub vendor_filings: u64,
    /// Fraction in `[0, 1]`; zero when the family has no filings.
    pub vendor_share: f64,
    pub avg_agent_groups: f64,
}

impl FamilyTotals {
    /// Sum the window counters of each fund snapshot. Missing counters count as zero.
    pub fn from_funds(funds: &[FundRecord]) -> Self {
        let total_filings: u64 = funds
            .iter()
            .map(|f| f.total_filings_in_window.unwrap_or(0))
            .sum();
        let vendor_filings: u64 = funds
            .iter()
            .map(|f| f.vendor_filings_in_window.unwrap_or(0))
            .sum();
        let agent_groups: u64 = funds
            .iter()
            .map(|f| f.total_agent_groups_in_window.unwrap_or(0))
            .sum();

        Self {
            funds: funds.len(),
            total_filings,
            vendor_filings,
            vendor_share: if total_filings == 0 {
                0.0
            } else {
                vendor_filings as f64 / total_filings as f64
            },
            avg_agent_groups: if funds.is_empty() {
                0.0
            } else {
                agent_groups as f64 / funds.len() as f64
            },
        }
    }
}

/// Scores fund families against one family policy.
#[derive(Debug, Clone)]
pub struct FamilyClassifier {
    policy: FamilyScoringConfig,
    vendor: String,
}

impl FamilyClassifier {
    pub fn new(policy: FamilyScoringConfig, vendor: &str) -> Self {
        Self {
            policy,
            vendor: vendor.trim().to_string(),
        }
    }

    /// Score one family from its deduplicated funds.
    pub fn classify(&self, funds: &[FundRecord]) -> FamilyScoreResult {
        let policy = &self.policy;
        let totals = FamilyTotals::from_funds(funds);

        let value_points = points_at_least(&policy.window_filings, totals.total_filings)
            + points_at_least(&policy.fund_count, totals.funds);
        let openness_points = points_below(&policy.share, totals.vendor_share)
            + points_at_least(&policy.avg_agent_groups, totals.avg_agent_groups);

        FamilyScoreResult {
            potential_value: tier_for(&policy.value_tiers, value_points, MoneyTier::One),
            openness: tier_for(&policy.openness_tiers, openness_points, OpennessTier::VeryLow),
            conversation_script: policy.conversation_script.clone(),
            rationale: format!(
                "Funds={}, total filings={}, {} share={:.2}%, avg agent groups used={:.2}.",
                totals.funds,
                totals.total_filings,
                self.vendor,
                totals.vendor_share * 100.0,
                totals.avg_agent_groups
            ),
        }
    }

    /// Group sorted funds by family and score each family.
    pub fn classify_all(&self, funds: Vec<FundRecord>) -> Vec<FamilyGroup> {
        group_by_family(funds)
            .into_iter()
            .map(|(family_name, funds)| {
                let score = self.classify(&funds);
                FamilyGroup {
                    family_name,
                    funds,
                    score,
                }
            })
            .collect()
    }
}
