//! Entity-level money and switch tiers.

use crate::config::ScoringConfig;
use crate::models::{EntityProfile, MoneyTier, ScoreResult, ScoredEntity, SwitchTier};
use crate::scoring::tiers::{points_at_least, points_below, tier_for};

/// Point breakdown behind a score, kept for the rationale text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Points {
    pub volume: u32,
    pub share: u32,
    pub form_bonus: u32,
    pub switch_share: u32,
    pub switch_agents: u32,
    pub not_dominant: u32,
    pub capped: bool,
}

impl Points {
    pub fn money(&self) -> u32 {
        self.volume + self.share + self.form_bonus
    }

    pub fn switch(&self) -> u32 {
        self.switch_share + self.switch_agents + self.not_dominant
    }
}

/// Scores entity profiles against one scoring policy.
#[derive(Debug, Clone)]
pub struct OpportunityClassifier {
    policy: ScoringConfig,
    vendor: String,
}

impl OpportunityClassifier {
    pub fn new(policy: ScoringConfig, vendor: &str) -> Self {
        let high_value_forms = policy
            .high_value_forms
            .iter()
            .map(|form| form.trim().to_uppercase())
            .filter(|form| !form.is_empty())
            .collect();
        Self {
            policy: ScoringConfig {
                high_value_forms,
                ..policy
            },
            vendor: vendor.trim().to_string(),
        }
    }

    /// True if the form type contains any configured high-value code.
    pub fn is_high_value_form(&self, form_type: &str) -> bool {
        let form = form_type.trim().to_uppercase();
        !form.is_empty()
            && self
                .policy
                .high_value_forms
                .iter()
                .any(|code| form.contains(code.as_str()))
    }

    /// Points awarded to a profile.
    pub fn points(&self, profile: &EntityProfile) -> Points {
        let policy = &self.policy;
        let share = profile.vendor_share;

        Points {
            volume: points_at_least(&policy.volume, profile.total_filings),
            share: points_at_least(&policy.share, share),
            form_bonus: if self.is_high_value_form(&profile.vendor_last_form_type) {
                policy.high_value_bonus
            } else {
                0
            },
            switch_share: points_below(&policy.switch_share, share),
            switch_agents: points_at_least(&policy.switch_other_agents, profile.other_agent_count),
            not_dominant: if profile.is_vendor_dominant {
                0
            } else {
                policy.not_dominant_points
            },
            capped: share > policy.dominance_cap,
        }
    }

    /// Score one profile.
    pub fn classify(&self, profile: &EntityProfile) -> ScoreResult {
        let points = self.points(profile);

        let money_tier = tier_for(&self.policy.money_tiers, points.money(), MoneyTier::One);
        let switch_tier = if points.capped {
            SwitchTier::VeryLow
        } else {
            tier_for(&self.policy.switch_tiers, points.switch(), SwitchTier::VeryLow)
        };

        ScoreResult {
            money_tier,
            switch_tier,
            rationale: self.rationale(profile, &points),
        }
    }

    /// Score profiles, keeping their order.
    pub fn classify_all(&self, profiles: Vec<EntityProfile>) -> Vec<ScoredEntity> {
        profiles
            .into_iter()
            .map(|profile| {
                let score = self.classify(&profile);
                ScoredEntity { profile, score }
            })
            .collect()
    }

    fn rationale(&self, profile: &EntityProfile, points: &Points) -> String {
        let mut parts = vec![
            format!(
                "Total filings={} (volume points {})",
                profile.total_filings, points.volume
            ),
            format!(
                "{} share={:.2}%",
                self.vendor,
                profile.vendor_share_pct()
            ),
            format!("other agents={}", profile.other_agent_count),
            format!("dominant={}", profile.is_vendor_dominant),
        ];

        if points.form_bonus > 0 {
            parts.push(format!(
                "high-value last form {}",
                profile.vendor_last_form_type
            ));
        }
        if points.capped {
            parts.push(format!(
                "dominance cap applied above {:.0}%",
                self.policy.dominance_cap * 100.0
            ));
        }

        format!("{}.", parts.join(", "))
    }
}
