//! SWOT classification: ordered, independent threshold rules over aggregated KPIs.
//!
//! Every rule is evaluated for every product (no short-circuiting), so a product can
//! land in several quadrants or trigger several findings in one quadrant. A rule whose
//! operands are missing does not fire; a product without sentiment observations is
//! never treated as neutral.

use std::collections::BTreeMap;

use serde::Serialize;
use vel_core::{ProductId, SourceRef};

use crate::aggregate::{Aggregation, ProductKpis};

pub const EXCELLENT_VALUE_MIN_SENTIMENT: f64 = 0.5;
pub const EXCELLENT_VALUE_PRICE_FACTOR: f64 = 1.1;
pub const HIGH_SATISFACTION_MIN_SENTIMENT: f64 = 0.6;
pub const CATEGORY_EDGE_FACTOR: f64 = 0.90;
pub const DISSATISFACTION_MAX_SENTIMENT: f64 = -0.2;
pub const CATEGORY_OVERPRICED_FACTOR: f64 = 1.10;
pub const EXPENSIVE_PRICE_FACTOR: f64 = 1.2;
pub const EXPENSIVE_MAX_SENTIMENT: f64 = 0.3;
pub const COMPETITOR_EDGE_FACTOR: f64 = 0.85;
pub const IMPROVABLE_SENTIMENT_RANGE: (f64, f64) = (0.2, 0.5);
pub const PREMIUM_MIN_SENTIMENT: f64 = 0.7;
pub const PREMIUM_PRICE_FACTOR: f64 = 0.9;
pub const SOCIAL_PROOF_MIN_SENTIMENT: f64 = 0.5;
pub const NARROW_PORTFOLIO_BELOW: usize = 5;
pub const OUTFLANK_MARGIN: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
    Strength,
    Weakness,
    Opportunity,
    Threat,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Strength,
        Quadrant::Weakness,
        Quadrant::Opportunity,
        Quadrant::Threat,
    ];

    pub fn plural(self) -> &'static str {
        match self {
            Self::Strength => "strengths",
            Self::Weakness => "weaknesses",
            Self::Opportunity => "opportunities",
            Self::Threat => "threats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
}

impl From<&ProductKpis> for ProductRef {
    fn from(kpis: &ProductKpis) -> Self {
        Self {
            id: kpis.product.id,
            name: kpis.product.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Product(ProductRef),
    Category { name: String },
    Portfolio,
}

/// Which rule fired, with the operand values it compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Rule {
    ExcellentValue { sentiment: f64, price: f64, overall_mean: f64 },
    HighSatisfaction { sentiment: f64 },
    CategoryPriceEdge { category: String, price: f64, category_mean: f64 },
    Dissatisfaction { sentiment: f64 },
    CategoryOverpriced { category: String, price: f64, category_mean: f64 },
    ExpensiveWithoutLove { price: f64, overall_mean: f64, sentiment: f64 },
    CompetitorPriceEdge { competitor: String, price: f64, peer_mean: f64 },
    ImprovableSatisfaction { sentiment: f64 },
    PremiumUpsell { sentiment: f64, price: f64, overall_mean: f64 },
    SocialProofLeverage { sentiment: f64 },
    ThinCategoryCoverage { category: String },
    NarrowPortfolio { product_count: usize },
    OutflankedByPeer { competitor: String, sentiment: f64, peer: ProductRef, peer_sentiment: f64 },
    NothingIdentified,
}

impl Rule {
    pub fn id(&self) -> &'static str {
        match self {
            Self::ExcellentValue { .. } => "excellent_value",
            Self::HighSatisfaction { .. } => "high_satisfaction",
            Self::CategoryPriceEdge { .. } => "category_price_edge",
            Self::Dissatisfaction { .. } => "dissatisfaction",
            Self::CategoryOverpriced { .. } => "category_overpriced",
            Self::ExpensiveWithoutLove { .. } => "expensive_without_love",
            Self::CompetitorPriceEdge { .. } => "competitor_price_edge",
            Self::ImprovableSatisfaction { .. } => "improvable_satisfaction",
            Self::PremiumUpsell { .. } => "premium_upsell",
            Self::SocialProofLeverage { .. } => "social_proof_leverage",
            Self::ThinCategoryCoverage { .. } => "thin_category_coverage",
            Self::NarrowPortfolio { .. } => "narrow_portfolio",
            Self::OutflankedByPeer { .. } => "outflanked_by_peer",
            Self::NothingIdentified => "nothing_identified",
        }
    }
}

/// One SWOT statement as data, with the source references of the facts it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub quadrant: Quadrant,
    pub subject: Subject,
    pub rule: Rule,
    pub evidence: Vec<SourceRef>,
}

impl Finding {
    pub fn product_id(&self) -> Option<ProductId> {
        match &self.subject {
            Subject::Product(p) => Some(p.id),
            _ => None,
        }
    }

    pub fn is_filler(&self) -> bool {
        matches!(self.rule, Rule::NothingIdentified)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SwotReport {
    pub strengths: Vec<Finding>,
    pub weaknesses: Vec<Finding>,
    pub opportunities: Vec<Finding>,
    pub threats: Vec<Finding>,
}

impl SwotReport {
    pub fn quadrant(&self, quadrant: Quadrant) -> &[Finding] {
        match quadrant {
            Quadrant::Strength => &self.strengths,
            Quadrant::Weakness => &self.weaknesses,
            Quadrant::Opportunity => &self.opportunities,
            Quadrant::Threat => &self.threats,
        }
    }

    fn quadrant_mut(&mut self, quadrant: Quadrant) -> &mut Vec<Finding> {
        match quadrant {
            Quadrant::Strength => &mut self.strengths,
            Quadrant::Weakness => &mut self.weaknesses,
            Quadrant::Opportunity => &mut self.opportunities,
            Quadrant::Threat => &mut self.threats,
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        Quadrant::ALL.into_iter().flat_map(|q| self.quadrant(q).iter())
    }

    pub fn for_product(&self, id: ProductId) -> impl Iterator<Item = &Finding> {
        self.findings().filter(move |f| f.product_id() == Some(id))
    }

    pub fn has_rule(&self, quadrant: Quadrant, rule_id: &str) -> bool {
        self.quadrant(quadrant).iter().any(|f| f.rule.id() == rule_id)
    }

    fn push(&mut self, finding: Finding) {
        self.quadrant_mut(finding.quadrant).push(finding);
    }

    fn fill_empty_quadrants(&mut self) {
        for quadrant in Quadrant::ALL {
            let list = self.quadrant_mut(quadrant);
            if list.is_empty() {
                list.push(Finding {
                    quadrant,
                    subject: Subject::Portfolio,
                    rule: Rule::NothingIdentified,
                    evidence: Vec::new(),
                });
            }
        }
    }
}

fn price_evidence(kpis: &ProductKpis) -> Vec<SourceRef> {
    kpis.latest_price_source.iter().cloned().collect()
}

fn sentiment_evidence(kpis: &ProductKpis) -> Vec<SourceRef> {
    kpis.sentiment_sources.clone()
}

fn combined_evidence(kpis: &ProductKpis) -> Vec<SourceRef> {
    let mut out = price_evidence(kpis);
    out.extend(sentiment_evidence(kpis));
    out
}

struct ProductPass<'a> {
    kpis: &'a ProductKpis,
    findings: Vec<Finding>,
}

impl<'a> ProductPass<'a> {
    fn new(kpis: &'a ProductKpis) -> Self {
        Self {
            kpis,
            findings: Vec::new(),
        }
    }

    fn emit(&mut self, quadrant: Quadrant, rule: Rule, evidence: Vec<SourceRef>) {
        self.findings.push(Finding {
            quadrant,
            subject: Subject::Product(ProductRef::from(self.kpis)),
            rule,
            evidence,
        });
    }
}

/// Best outflanking peer per product, computed per competitor group.
fn outflanking_peers(agg: &Aggregation) -> BTreeMap<ProductId, (&ProductKpis, f64)> {
    let mut groups: BTreeMap<&str, Vec<(&ProductKpis, f64)>> = BTreeMap::new();
    for kpis in &agg.products {
        if let (Some(competitor), Some(s)) = (&kpis.product.competitor, kpis.mean_sentiment) {
            groups.entry(competitor.as_str()).or_default().push((kpis, s));
        }
    }

    let mut out = BTreeMap::new();
    for members in groups.values() {
        for (kpis, s) in members {
            let mut best: Option<(&ProductKpis, f64)> = None;
            for (peer, peer_s) in members {
                if peer.product.id == kpis.product.id || *peer_s <= s + OUTFLANK_MARGIN {
                    continue;
                }
                if best.map_or(true, |(_, b)| *peer_s > b) {
                    best = Some((*peer, *peer_s));
                }
            }
            if let Some(best) = best {
                out.insert(kpis.product.id, best);
            }
        }
    }
    out
}

pub fn classify(agg: &Aggregation) -> SwotReport {
    let mut report = SwotReport::default();
    let overall = agg.overall_mean_price;
    let outflanked = outflanking_peers(agg);

    for kpis in &agg.products {
        let mut pass = ProductPass::new(kpis);
        let sentiment = kpis.mean_sentiment;
        let price = kpis.latest_price;
        let category = kpis.product.category.as_ref();

        // Strengths
        if let (Some(s), Some(p), Some(a)) = (sentiment, price, overall) {
            if s > EXCELLENT_VALUE_MIN_SENTIMENT && p < a * EXCELLENT_VALUE_PRICE_FACTOR {
                pass.emit(
                    Quadrant::Strength,
                    Rule::ExcellentValue { sentiment: s, price: p, overall_mean: a },
                    combined_evidence(kpis),
                );
            }
        }
        if let Some(s) = sentiment {
            if s > HIGH_SATISFACTION_MIN_SENTIMENT {
                pass.emit(
                    Quadrant::Strength,
                    Rule::HighSatisfaction { sentiment: s },
                    sentiment_evidence(kpis),
                );
            }
        }
        if let (Some(c_name), Some(p), Some(c)) = (category, price, kpis.category_mean_price) {
            if p < c * CATEGORY_EDGE_FACTOR {
                pass.emit(
                    Quadrant::Strength,
                    Rule::CategoryPriceEdge {
                        category: c_name.clone(),
                        price: p,
                        category_mean: c,
                    },
                    price_evidence(kpis),
                );
            }
        }

        // Weaknesses
        if let Some(s) = sentiment {
            if s < DISSATISFACTION_MAX_SENTIMENT {
                pass.emit(
                    Quadrant::Weakness,
                    Rule::Dissatisfaction { sentiment: s },
                    sentiment_evidence(kpis),
                );
            }
        }
        if let (Some(c_name), Some(p), Some(c)) = (category, price, kpis.category_mean_price) {
            if p > c * CATEGORY_OVERPRICED_FACTOR {
                pass.emit(
                    Quadrant::Weakness,
                    Rule::CategoryOverpriced {
                        category: c_name.clone(),
                        price: p,
                        category_mean: c,
                    },
                    price_evidence(kpis),
                );
            }
        }
        if let (Some(s), Some(p), Some(a)) = (sentiment, price, overall) {
            if p > a * EXPENSIVE_PRICE_FACTOR && s < EXPENSIVE_MAX_SENTIMENT {
                pass.emit(
                    Quadrant::Weakness,
                    Rule::ExpensiveWithoutLove { price: p, overall_mean: a, sentiment: s },
                    combined_evidence(kpis),
                );
            }
        }

        // Opportunities
        if let (Some(competitor), Some(p), Some(k)) = (
            kpis.product.competitor.as_ref(),
            price,
            agg.competitor_peer_mean(kpis),
        ) {
            if p < k * COMPETITOR_EDGE_FACTOR {
                pass.emit(
                    Quadrant::Opportunity,
                    Rule::CompetitorPriceEdge {
                        competitor: competitor.clone(),
                        price: p,
                        peer_mean: k,
                    },
                    price_evidence(kpis),
                );
            }
        }
        if let Some(s) = sentiment {
            let (low, high) = IMPROVABLE_SENTIMENT_RANGE;
            if (low..=high).contains(&s) {
                pass.emit(
                    Quadrant::Opportunity,
                    Rule::ImprovableSatisfaction { sentiment: s },
                    sentiment_evidence(kpis),
                );
            }
        }
        if let (Some(s), Some(p), Some(a)) = (sentiment, price, overall) {
            if s > PREMIUM_MIN_SENTIMENT && p > a * PREMIUM_PRICE_FACTOR {
                pass.emit(
                    Quadrant::Opportunity,
                    Rule::PremiumUpsell { sentiment: s, price: p, overall_mean: a },
                    combined_evidence(kpis),
                );
            }
        }
        if let Some(s) = sentiment {
            if s > SOCIAL_PROOF_MIN_SENTIMENT {
                pass.emit(
                    Quadrant::Opportunity,
                    Rule::SocialProofLeverage { sentiment: s },
                    sentiment_evidence(kpis),
                );
            }
        }
        let mut findings = pass.findings;
        if let Some(c_name) = category {
            if agg.category_size(c_name) == 1 {
                findings.push(Finding {
                    quadrant: Quadrant::Opportunity,
                    subject: Subject::Category { name: c_name.clone() },
                    rule: Rule::ThinCategoryCoverage { category: c_name.clone() },
                    evidence: combined_evidence(kpis),
                });
            }
        }

        // Threats
        if let (Some(competitor), Some(s), Some((peer, peer_s))) = (
            kpis.product.competitor.as_ref(),
            sentiment,
            outflanked.get(&kpis.product.id),
        ) {
            let mut evidence = sentiment_evidence(kpis);
            evidence.extend(sentiment_evidence(peer));
            findings.push(Finding {
                quadrant: Quadrant::Threat,
                subject: Subject::Product(ProductRef::from(kpis)),
                rule: Rule::OutflankedByPeer {
                    competitor: competitor.clone(),
                    sentiment: s,
                    peer: ProductRef::from(*peer),
                    peer_sentiment: *peer_s,
                },
                evidence,
            });
        }

        for finding in findings {
            report.push(finding);
        }
    }

    let product_count = agg.product_count();
    if product_count > 0 && product_count < NARROW_PORTFOLIO_BELOW {
        report.push(Finding {
            quadrant: Quadrant::Opportunity,
            subject: Subject::Portfolio,
            rule: Rule::NarrowPortfolio { product_count },
            evidence: Vec::new(),
        });
    }

    report.fill_empty_quadrants();
    report
}
