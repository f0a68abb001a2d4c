// src/fetcher/prompt.rs
//! The fixed analyst prompt sent on every run.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TargetSource {
    pub name: &'static str,
    pub focus: &'static str,
}

/// Outlets shown on `/api/sources`.
pub const PRIORITY_SOURCES: &[TargetSource] = &[
    TargetSource {
        name: "Fibre2Fashion",
        focus: "Global supply chain & market trends",
    },
    TargetSource {
        name: "Just Style",
        focus: "Sourcing & sustainability",
    },
    TargetSource {
        name: "Textile Exchange",
        focus: "Sustainable materials & standards",
    },
    TargetSource {
        name: "The Textile Magazine",
        focus: "Indian industry & machinery",
    },
    TargetSource {
        name: "Bloomberg/FT (Textile Sector)",
        focus: "Financials & M&A",
    },
];

/// Search targets as written into the prompt.
const SEARCH_TARGETS: &[&str] = &[
    "Fibre2Fashion",
    "Just Style",
    "Textile Exchange",
    "The Textile Magazine",
    "Global financial news related to textile companies (Bloomberg, FT context)",
];

const CATEGORIES: &[(&str, &str)] = &[
    (
        "Financial News",
        "Stock moves, M&A, earnings of major textile/apparel holdings",
    ),
    (
        "Market Trends",
        "Cotton prices, synthetic fiber demand, supply chain shifts",
    ),
    (
        "Corporate Updates",
        "New factories, bankruptcies, strategic partnerships",
    ),
    (
        "Sustainability & Innovation",
        "New materials, regulations, circular economy",
    ),
];

pub fn analyst_prompt() -> String {
    let mut out = String::with_capacity(1_600);
    out.push_str(
        "You are a senior market analyst for the global textile and fabric industry.\n\
         Your task is to compile a \"Daily Executive Briefing\" by searching for the latest news (last 24-48 hours).\n\n\
         TARGET SOURCES TO PRIORITIZE SEARCH FOR:\n",
    );
    for target in SEARCH_TARGETS {
        out.push_str(&format!("- {target}\n"));
    }

    out.push_str("\nREQUIRED INFORMATION CATEGORIES:\n");
    for (i, (name, detail)) in CATEGORIES.iter().enumerate() {
        out.push_str(&format!("{}. {name} ({detail}).\n", i + 1));
    }

    out.push_str(
        "\nOUTPUT FORMAT INSTRUCTIONS:\n\
         - Generate exactly 20-30 concise, high-impact bullet points.\n\
         - Use Markdown formatting.\n\
         - Group the bullets by category (e.g., ## Financials, ## Market Trends).\n\
         - Do not include intro or outro fluff.\n\
         - Focus on hard numbers, specific company names, and actionable intelligence.\n",
    );
    out
}
