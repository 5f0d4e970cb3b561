//! Plain-text rendering of findings and the strategic overview.

use serde::Serialize;

use crate::strategic::{Baseline, PriceGap, StrategicOverview, TopStrength};
use crate::swot::{Finding, Quadrant, Rule, Subject, SwotReport};

pub const PENDING_STRENGTH: &str = "Top strength pending: no sentiment data collected yet";
pub const PENDING_OPPORTUNITY: &str = "Top opportunity pending: no comparable price data collected yet";

fn subject_name(subject: &Subject) -> &str {
    match subject {
        Subject::Product(p) => &p.name,
        Subject::Category { name } => name,
        Subject::Portfolio => "Portfolio",
    }
}

fn filler(quadrant: Quadrant) -> String {
    format!("No significant {} identified yet", quadrant.plural())
}

pub fn finding_text(finding: &Finding) -> String {
    let name = subject_name(&finding.subject);
    match &finding.rule {
        Rule::ExcellentValue { sentiment, price, overall_mean } => format!(
            "{name}: excellent value, sentiment {sentiment:.2} at ${price:.2} (market average ${overall_mean:.2})"
        ),
        Rule::HighSatisfaction { sentiment } => {
            format!("{name}: high customer satisfaction (sentiment {sentiment:.2})")
        }
        Rule::CategoryPriceEdge { category, price, category_mean } => format!(
            "{name}: priced ${price:.2}, more than 10% below the {category} average of ${category_mean:.2}"
        ),
        Rule::Dissatisfaction { sentiment } => {
            format!("{name}: customer dissatisfaction (sentiment {sentiment:.2})")
        }
        Rule::CategoryOverpriced { category, price, category_mean } => format!(
            "{name}: priced ${price:.2}, more than 10% above the {category} average of ${category_mean:.2}"
        ),
        Rule::ExpensiveWithoutLove { price, overall_mean, sentiment } => format!(
            "{name}: ${price:.2} is well above the market average of ${overall_mean:.2} without matching sentiment ({sentiment:.2})"
        ),
        Rule::CompetitorPriceEdge { competitor, price, peer_mean } => format!(
            "{name}: ${price:.2} undercuts other {competitor} products (average ${peer_mean:.2}) by more than 15%"
        ),
        Rule::ImprovableSatisfaction { sentiment } => {
            format!("{name}: moderate sentiment ({sentiment:.2}) leaves room to improve satisfaction")
        }
        Rule::PremiumUpsell { sentiment, price, overall_mean } => format!(
            "{name}: strong sentiment ({sentiment:.2}) supports premium positioning at ${price:.2} (market average ${overall_mean:.2})"
        ),
        Rule::SocialProofLeverage { sentiment } => {
            format!("{name}: positive reviews ({sentiment:.2}) can be leveraged as social proof")
        }
        Rule::ThinCategoryCoverage { category } => {
            format!("{category}: only one product tracked, room to expand the category")
        }
        Rule::NarrowPortfolio { product_count } => {
            format!("Portfolio: narrow coverage ({product_count} products), track more competitors")
        }
        Rule::OutflankedByPeer { competitor, sentiment, peer, peer_sentiment } => format!(
            "{name}: outflanked by {competitor} sibling {} (sentiment {peer_sentiment:.2} vs {sentiment:.2})",
            peer.name
        ),
        Rule::NothingIdentified => filler(finding.quadrant),
    }
}

/// Rendered SWOT lists in the same shape as [`SwotReport`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SwotText {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

pub fn swot_text(report: &SwotReport) -> SwotText {
    let render = |list: &[Finding]| -> Vec<String> { list.iter().map(finding_text).collect() };
    SwotText {
        strengths: render(&report.strengths),
        weaknesses: render(&report.weaknesses),
        opportunities: render(&report.opportunities),
        threats: render(&report.threats),
    }
}

fn strength_line(top: Option<&TopStrength>) -> String {
    match top {
        Some(t) => format!(
            "Top strength: {} (sentiment {:.2})",
            t.product.name, t.mean_sentiment
        ),
        None => PENDING_STRENGTH.to_string(),
    }
}

fn opportunity_line(gap: Option<&PriceGap>) -> String {
    let Some(gap) = gap else {
        return PENDING_OPPORTUNITY.to_string();
    };
    let baseline = match &gap.baseline {
        Baseline::Competitor { name } => format!("other {name} products"),
        Baseline::Category { name } => format!("the {name} category"),
    };
    let direction = if gap.is_below_baseline() { "below" } else { "above" };
    format!(
        "Top opportunity: {} at ${:.2} is {}% {direction} {baseline} (average ${:.2})",
        gap.product.name,
        gap.price,
        gap.gap_percent.abs(),
        gap.baseline_mean
    )
}

/// One-line strategic overview; absent selections render as pending-data text.
pub fn strategic_headline(overview: &StrategicOverview) -> String {
    format!(
        "{}. {}.",
        strength_line(overview.top_strength.as_ref()),
        opportunity_line(overview.top_opportunity.as_ref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::strategic::select_strategic;
    use crate::swot::classify;
    use crate::testing::*;

    #[test]
    fn single_product_reports_count_literally() {
        let agg = aggregate(&snapshot(vec![product(1, "Yoga Mat Pro").build()]));
        let text = swot_text(&classify(&agg));
        assert!(text
            .opportunities
            .iter()
            .any(|line| line.contains("(1 products)")));
    }

    #[test]
    fn empty_quadrants_render_filler() {
        let text = swot_text(&classify(&aggregate(&snapshot(vec![]))));
        assert_eq!(text.strengths, vec!["No significant strengths identified yet"]);
        assert_eq!(text.weaknesses, vec!["No significant weaknesses identified yet"]);
        assert_eq!(text.opportunities, vec!["No significant opportunities identified yet"]);
        assert_eq!(text.threats, vec!["No significant threats identified yet"]);
    }

    #[test]
    fn headline_is_pending_without_data() {
        let headline = strategic_headline(&StrategicOverview::default());
        assert!(headline.contains(PENDING_STRENGTH));
        assert!(headline.contains(PENDING_OPPORTUNITY));
    }

    #[test]
    fn headline_names_product_and_gap() {
        let agg = aggregate(&snapshot(vec![
            product(1, "Standing Desk").category("Office").price(80.0).sentiment(0.9).build(),
            product(2, "Desk Lamp").category("Office").price(120.0).build(),
        ]));
        let headline = strategic_headline(&select_strategic(&agg));
        assert_eq!(
            headline,
            "Top strength: Standing Desk (sentiment 0.90). \
             Top opportunity: Standing Desk at $80.00 is 20% below the Office category (average $100.00)."
        );
    }
}
