//! Closed catalogs offered by the questionnaire
//!
//! Industries, organization types (with the reporting frameworks each one
//! maps to) and the ESG readiness questions with their fixed option sets.

use serde::{Deserialize, Serialize};

/// Industry entry that asks the user to type their own industry name
pub const OTHER_INDUSTRY: &str = "Others";

/// Industries offered in the profile form
pub const INDUSTRIES: &[&str] = &[
    "Agriculture",
    "Forestry",
    "Fishing",
    "Mining and Quarrying",
    "Oil and Gas Exploration",
    "Automotive",
    "Aerospace",
    "Electronics",
    "Textiles and Apparel",
    "Food and Beverage Manufacturing",
    "Steel and Metalworking",
    "Construction and Infrastructure",
    "Energy and Utilities",
    "Chemical Production",
    "Banking and Financial Services",
    "Insurance",
    "Retail and E-commerce",
    "Tourism and Hospitality",
    "Transportation and Logistics",
    "Real Estate and Property Management",
    "Healthcare and Pharmaceuticals",
    "Telecommunications",
    "Media and Entertainment",
    OTHER_INDUSTRY,
];

/// Returns true if `industry` is one of the named catalog entries
pub fn is_catalog_industry(industry: &str) -> bool {
    INDUSTRIES
        .iter()
        .any(|known| *known != OTHER_INDUSTRY && known.eq_ignore_ascii_case(industry.trim()))
}

/// Organization classifications used to pick reporting frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    PublicListedCompany,
    FinancialInstitution,
    SmeEnterprise,
    GovernmentAgency,
    Ngo,
    Others,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 6] = [
        OrganizationType::PublicListedCompany,
        OrganizationType::FinancialInstitution,
        OrganizationType::SmeEnterprise,
        OrganizationType::GovernmentAgency,
        OrganizationType::Ngo,
        OrganizationType::Others,
    ];

    /// Display label as shown in the questionnaire
    pub fn label(&self) -> &'static str {
        match self {
            OrganizationType::PublicListedCompany => "Public Listed Company",
            OrganizationType::FinancialInstitution => "Financial Institution",
            OrganizationType::SmeEnterprise => "SME/Enterprise",
            OrganizationType::GovernmentAgency => "Government Agency",
            OrganizationType::Ngo => "NGO",
            OrganizationType::Others => "Others",
        }
    }

    /// Frameworks applicable to this organization type, in priority order
    pub fn frameworks(&self) -> &'static [&'static str] {
        match self {
            OrganizationType::PublicListedCompany => &[
                "Bursa Malaysia Sustainability Reporting Guide (3rd Edition)",
                "Securities Commission Malaysia (SC): Malaysian Code on Corporate Governance (MCCG)",
                "Global Reporting Initiative (GRI)",
                "Task Force on Climate-related Financial Disclosures (TCFD)",
                "Sustainability Accounting Standards Board (SASB)",
                "GHG Protocol",
                "ISO 14001",
                "ISO 26000",
            ],
            OrganizationType::FinancialInstitution => &[
                "Bank Negara Malaysia (BNM) Climate Change and Principle-based Taxonomy (CCPT)",
                "Malaysian Sustainable Finance Roadmap",
                "Principles for Responsible Banking (PRB)",
                "Task Force on Climate-related Financial Disclosures (TCFD)",
                "Sustainability Accounting Standards Board (SASB)",
                "GHG Protocol",
                "ISO 14097",
            ],
            OrganizationType::SmeEnterprise => &[
                "Simplified ESG Disclosure Guide (SEDG)",
                "Bursa Malaysia's Basic Sustainability Guidelines for SMEs",
                "ISO 14001",
                "Global Reporting Initiative (GRI)",
                "GHG Protocol",
                "ISO 26000",
                "Sustainability Accounting Standards Board (SASB)",
            ],
            OrganizationType::GovernmentAgency => &[
                "Malaysian Code on Corporate Governance (MCCG)",
                "United Nations Sustainable Development Goals (SDGs)",
                "International Public Sector Accounting Standards (IPSAS)",
                "ISO 26000",
                "GHG Protocol",
            ],
            OrganizationType::Ngo => &[
                "Global Reporting Initiative (GRI)",
                "Social Value International (SVI)",
                "ISO 26000",
                "United Nations Sustainable Development Goals (SDGs)",
                "GHG Protocol",
            ],
            OrganizationType::Others => &[
                "UN Principles for Responsible Management Education (PRME)",
                "ISO 26000",
                "Sustainability Development Goals (SDGs)",
                "GHG Protocol",
                "ISO 14001",
            ],
        }
    }
}

impl std::fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OrganizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrganizationType::ALL
            .into_iter()
            .find(|t| {
                t.label().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", t).eq_ignore_ascii_case(wanted.replace(['_', '/', ' '], "").as_str())
            })
            .ok_or_else(|| format!("Unknown organization type: {}", s))
    }
}

/// One readiness question with its closed option set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessQuestion {
    /// Stable identifier used as the answer key
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
}

impl ReadinessQuestion {
    pub fn has_option(&self, answer: &str) -> bool {
        self.options.iter().any(|o| *o == answer)
    }
}

pub const READINESS_QUESTIONS: [ReadinessQuestion; 6] = [
    ReadinessQuestion {
        id: "initiatives",
        prompt: "1. Have you started formal ESG initiatives within your organization?",
        options: [
            "No, we haven't started yet.",
            "Yes, we've started basic efforts but lack a structured plan.",
            "Yes, we have a formalized ESG framework in place.",
            "Yes, we are actively implementing and reporting ESG practices.",
        ],
    },
    ReadinessQuestion {
        id: "motivation",
        prompt: "2. What is your primary reason for considering ESG initiatives?",
        options: [
            "To comply with regulations and avoid penalties.",
            "To improve reputation and meet stakeholder demands.",
            "To attract investors or access green funding.",
            "To align with broader sustainability and ethical goals.",
        ],
    },
    ReadinessQuestion {
        id: "ownership",
        prompt: "3. Do you have a team or individual responsible for ESG in your organization?",
        options: [
            "No, there is no one currently assigned to ESG matters.",
            "Yes, but they are not exclusively focused on ESG.",
            "Yes, we have a dedicated ESG team or officer.",
            "Yes, and we also involve external advisors for support.",
        ],
    },
    ReadinessQuestion {
        id: "standards_awareness",
        prompt: "4. Are you aware of the ESG standards relevant to your industry?",
        options: [
            "No, I am unfamiliar with industry-specific ESG standards.",
            "I've heard of them but don't fully understand how to apply them.",
            "Yes, I am somewhat familiar and have started researching.",
            "Yes, and we have begun aligning our operations with these standards.",
        ],
    },
    ReadinessQuestion {
        id: "impact_measurement",
        prompt: "5. Do you currently measure your environmental or social impacts?",
        options: [
            "No, we have not started measuring impacts.",
            "Yes, we measure basic indicators (e.g., waste, energy use).",
            "Yes, we track a range of metrics but need a better system.",
            "Yes, we have comprehensive metrics with detailed reports.",
        ],
    },
    ReadinessQuestion {
        id: "challenges",
        prompt: "6. What is your biggest challenge in starting or scaling ESG initiatives?",
        options: [
            "Lack of knowledge and expertise.",
            "Insufficient budget and resources.",
            "Difficulty aligning ESG goals with business priorities.",
            "Regulatory complexity and compliance requirements.",
        ],
    },
];

/// Look up a readiness question by its identifier
pub fn question(id: &str) -> Option<&'static ReadinessQuestion> {
    READINESS_QUESTIONS.iter().find(|q| q.id == id)
}
