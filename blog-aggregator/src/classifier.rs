use crate::types::Category;
use regex::Regex;
use std::sync::OnceLock;

/// Keyword lists per category. Order matters: it breaks ties the source
/// category cannot settle.
const KEYWORD_TABLE: &[(Category, &[&str])] = &[
    (
        Category::AiMl,
        &[
            "artificial intelligence",
            "machine learning",
            "deep learning",
            "neural network",
            "large language model",
            "llm",
            "generative ai",
            "gpt",
            "computer vision",
            "natural language processing",
            "chatbot",
            "reinforcement learning",
        ],
    ),
    (
        Category::WebDevelopment,
        &[
            "javascript",
            "typescript",
            "react",
            "frontend",
            "front-end",
            "css",
            "web app",
            "browser",
            "next.js",
            "node.js",
            "web development",
            "webassembly",
        ],
    ),
    (
        Category::CloudDevops,
        &[
            "kubernetes",
            "docker",
            "devops",
            "amazon web services",
            "azure",
            "google cloud",
            "terraform",
            "ci/cd",
            "serverless",
            "cloud native",
            "infrastructure as code",
            "microservices",
        ],
    ),
    (
        Category::Security,
        &[
            "security",
            "vulnerability",
            "cve-",
            "ransomware",
            "malware",
            "phishing",
            "encryption",
            "zero trust",
            "authentication",
            "exploit",
            "data breach",
        ],
    ),
    (
        Category::DataEngineering,
        &[
            "data pipeline",
            "data warehouse",
            "data lake",
            "big data",
            "analytics",
            "apache spark",
            "kafka",
            "sql",
            "database",
            "data engineering",
            "lakehouse",
        ],
    ),
    (
        Category::SoftwareEngineering,
        &[
            "refactoring",
            "unit test",
            "software architecture",
            "code review",
            "agile",
            "design pattern",
            "technical debt",
            "open source",
            "api design",
            "programming language",
            "software engineering",
        ],
    ),
];

fn markup_pattern() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"))
}

/// Lower-cased text with HTML tags replaced by spaces.
pub fn searchable_text(title: &str, description: &str) -> String {
    let text = format!("{title} {description}");
    markup_pattern().replace_all(&text, " ").to_lowercase()
}

/// Keyword-hit classifier over a fixed category table.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: &'static [(Category, &'static [&'static str])],
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            table: KEYWORD_TABLE,
        }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct keyword hits per category, in table order. `text` must already
    /// be lower-cased.
    pub fn keyword_hits(&self, text: &str) -> Vec<(Category, usize)> {
        self.table
            .iter()
            .map(|(category, keywords)| {
                let hits = keywords
                    .iter()
                    .filter(|keyword| text.contains(*keyword))
                    .count();
                (*category, hits)
            })
            .collect()
    }

    /// Most hits wins. Ties go to `source_category` when it is among the
    /// leaders, otherwise to the leader listed first. No hits at all falls
    /// back to `source_category`.
    pub fn classify(&self, title: &str, description: &str, source_category: Category) -> Category {
        let text = searchable_text(title, description);
        let hits = self.keyword_hits(&text);

        let best = hits.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if best == 0 {
            return source_category;
        }

        let leaders: Vec<Category> = hits
            .iter()
            .filter(|(_, count)| *count == best)
            .map(|(category, _)| *category)
            .collect();

        if leaders.contains(&source_category) {
            source_category
        } else {
            leaders[0]
        }
    }
}
