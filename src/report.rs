//! Plain-text and JSON rendering of gate decisions

use crate::gate::{GateDecision, SampleRequirement, Verdict};

impl GateDecision {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match self.verdict {
            Verdict::Ok => report.push_str("✅ OK: release approved\n"),
            Verdict::Warn => report.push_str("⚠️  WARN: release with caution\n"),
            Verdict::Block => report.push_str("🛑 BLOCK: release NOT recommended\n"),
        }
        if self.requires_human_review {
            report.push_str("👤 Human review required\n");
        }

        report.push_str(&format!("\n{}\n", self.risk_report.summary));
        for regression in &self.risk_report.regressions {
            report.push_str(&format!(
                "  [{}] {}/{}\n",
                regression.severity.as_str(),
                regression.metric_diff.suite,
                regression.message
            ));
        }

        let diff = &self.diff_summary;
        report.push_str(&format!(
            "\nMetrics compared: {} ({} regressed, {} improved, {} neutral)\n",
            diff.total_metrics, diff.regressions, diff.improvements, diff.neutral
        ));

        if !self.analyses.is_empty() {
            report.push_str("\n📊 Statistical Tests:\n");
            for a in &self.analyses {
                let r = &a.result;
                let needed = match r.samples_needed_for_power_80 {
                    SampleRequirement::Finite(n) => n.to_string(),
                    SampleRequirement::Unbounded => "unbounded".to_string(),
                };
                report.push_str(&format!(
                    "  {}/{} delta={:+.4} CI=[{:+.4}, {:+.4}] p={:.4} d={:.2} power={:.2} n80={} -> {}{}\n",
                    a.suite,
                    a.metric,
                    r.delta,
                    r.ci_lower,
                    r.ci_upper,
                    r.p_value,
                    r.effect_size,
                    r.power,
                    needed,
                    a.significance_verdict,
                    if a.noisy { " (noisy)" } else { "" }
                ));
            }
        }

        let flagged: Vec<_> = self
            .business_risk
            .iter()
            .filter(|b| b.verdict != Verdict::Ok)
            .collect();
        if !flagged.is_empty() {
            report.push_str("\n🎯 Business Risk:\n");
            for b in flagged {
                report.push_str(&format!(
                    "  {} [{}]{}\n",
                    b.note,
                    b.verdict,
                    if b.requires_human_review { " review" } else { "" }
                ));
            }
        }

        if !self.trends.is_empty() {
            report.push_str("\n📈 Trends:\n");
            for t in &self.trends {
                let breach = t
                    .projected_breach_releases
                    .map_or_else(|| "-".to_string(), |n| n.to_string());
                report.push_str(&format!(
                    "  {} slope={:+.4} r²={:.2} breach={} {}\n",
                    t.metric, t.slope, t.r_squared, breach, t.recommendation
                ));
            }
        }

        if !self.skipped.is_empty() {
            report.push_str(&format!("\n⏭️  Skipped ({}):\n", self.skipped.len()));
            for s in &self.skipped {
                match &s.suite {
                    Some(suite) => {
                        report.push_str(&format!("  - {}/{}: {}\n", suite, s.metric, s.error))
                    }
                    None => report.push_str(&format!("  - {}: {}\n", s.metric, s.error)),
                }
            }
        }

        if !self.excluded.is_empty() {
            report.push_str(&format!("\n🔇 Excluded ({}):\n", self.excluded.len()));
            for e in &self.excluded {
                report.push_str(&format!("  - {}/{}: {}\n", e.suite, e.metric, e.reason));
            }
        }

        report
    }

    /// Pretty-printed JSON document of the full decision
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
