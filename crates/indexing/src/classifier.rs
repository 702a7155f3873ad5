use catalog_common::*;

/// Extensions that mark a file as a code asset on their own
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "html", "css", "sql", "json", "java", "cpp", "c",
];

const CAREER_FILENAME_KEYWORDS: &[&str] = &["resume", "cv", "portfolio"];
const CAREER_SECTION_KEYWORDS: &[&str] = &["education", "experience", "skills", "project", "activities"];
const IDENTITY_KEYWORDS: &[&str] = &[
    "passport", "visa", "driving license", "aadhaar", "ssn", "social security",
];
const FINANCIAL_KEYWORDS: &[&str] = &[
    "tax returns", "w2", "1099", "invoice", "receipt", "payment success", "transaction id", "billing",
];
const CODE_TOKENS: &[&str] = &["def ", "function", "import "];

/// Only this many leading characters of the text are searched for names
const NAME_SCAN_CHARS: usize = 200;

const DEFAULT_NAME: &str = "General";

/// Lowercased views of one document, computed once and shared by every rule
#[derive(Debug)]
pub struct Signals<'a> {
    pub text: &'a str,
    pub text_lower: String,
    pub filename_lower: String,
    pub combined: String,
    pub file_type: &'a str,
    pub detected_name: String,
}

impl<'a> Signals<'a> {
    fn new(text: &'a str, record: &'a FileRecord, names: &NameTable) -> Self {
        let text_lower = text.to_lowercase();
        let filename_lower = record.filename.to_lowercase();
        let combined = format!("{} \n {}", filename_lower, text_lower);
        let detected_name = names.detect(&filename_lower, &text_lower);

        Self {
            text,
            text_lower,
            filename_lower,
            combined,
            file_type: &record.file_type,
            detected_name,
        }
    }

    fn text_has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.text_lower.contains(kw))
    }

    fn combined_has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.combined.contains(kw))
    }
}

/// How a matched rule picks its subfolder
#[derive(Debug, Clone, Copy)]
pub enum SubfolderRule {
    /// The person label found by name detection
    DetectedName,
    Fixed(&'static str),
    Derived(fn(&Signals) -> &'static str),
}

/// One row of the ordered rule table
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    /// Higher runs first
    pub priority: u8,
    pub matches: fn(&Signals) -> bool,
    pub subfolder: SubfolderRule,
    pub confidence: u8,
}

impl CategoryRule {
    fn subfolder_for(&self, signals: &Signals) -> String {
        match self.subfolder {
            SubfolderRule::DetectedName => signals.detected_name.clone(),
            SubfolderRule::Fixed(name) => name.to_string(),
            SubfolderRule::Derived(pick) => pick(signals).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct NameTable {
    filename_names: Vec<NameToken>,
    text_names: Vec<NameToken>,
}

impl NameTable {
    /// Filename tokens win over text tokens; the text is only searched near the top
    fn detect(&self, filename_lower: &str, text_lower: &str) -> String {
        if let Some(hit) = self
            .filename_names
            .iter()
            .find(|name| filename_lower.contains(name.token.as_str()))
        {
            return hit.label.clone();
        }

        let head: String = text_lower.chars().take(NAME_SCAN_CHARS).collect();
        self.text_names
            .iter()
            .find(|name| head.contains(name.token.as_str()))
            .map(|name| name.label.clone())
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }
}

fn is_career(s: &Signals) -> bool {
    CAREER_FILENAME_KEYWORDS.iter().any(|kw| s.filename_lower.contains(kw))
        || (s.text_lower.chars().count() > 50
            && s.text_has_any(CAREER_SECTION_KEYWORDS)
            && s.text_lower.contains("summary"))
}

fn is_academic(s: &Signals) -> bool {
    s.combined.contains("assignment")
        || s.combined.contains("homework")
        || (s.text_lower.contains("professor") && s.text_lower.contains("semester"))
        || s.combined.contains("transcript")
        || s.text_lower.contains("university of")
}

fn academic_subfolder(s: &Signals) -> &'static str {
    if s.combined.contains("assignment") {
        "Assignments"
    } else if s.combined.contains("lecture") || s.text_lower.contains("slides") {
        "Lectures"
    } else if s.combined.contains("sop") || s.text_lower.contains("statement of purpose") {
        "SOPs"
    } else {
        "General"
    }
}

fn is_identity(s: &Signals) -> bool {
    s.combined_has_any(IDENTITY_KEYWORDS)
}

fn is_financial(s: &Signals) -> bool {
    s.combined_has_any(FINANCIAL_KEYWORDS)
}

/// Code tokens are matched case-sensitively against the raw text
fn is_project(s: &Signals) -> bool {
    CODE_EXTENSIONS.contains(&s.file_type)
        || CODE_TOKENS.iter().any(|token| s.text.contains(token))
        || s.text_lower.contains("select * from")
}

/// The built-in rule table, highest priority first
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule {
            category: Category::Career,
            priority: 100,
            matches: is_career,
            subfolder: SubfolderRule::DetectedName,
            confidence: 90,
        },
        CategoryRule {
            category: Category::Academic,
            priority: 80,
            matches: is_academic,
            subfolder: SubfolderRule::Derived(academic_subfolder),
            confidence: 85,
        },
        CategoryRule {
            category: Category::Identity,
            priority: 60,
            matches: is_identity,
            subfolder: SubfolderRule::DetectedName,
            confidence: 95,
        },
        CategoryRule {
            category: Category::Financial,
            priority: 40,
            matches: is_financial,
            subfolder: SubfolderRule::Fixed("Receipts_Invoices"),
            confidence: 88,
        },
        CategoryRule {
            category: Category::Projects,
            priority: 20,
            matches: is_project,
            subfolder: SubfolderRule::Fixed("Code_Assets"),
            confidence: 90,
        },
    ]
}

/// Deterministic rule-based document classifier.
///
/// Rules are evaluated in priority order and the first match wins. When no
/// rule matches the document lands in `Miscellaneous/Uncategorized` at 40.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
    names: NameTable,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::with_rules(config, default_rules())
    }

    pub fn with_rules(config: &ClassifierConfig, mut rules: Vec<CategoryRule>) -> Self {
        // stable sort keeps insertion order among equal priorities
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            rules,
            names: NameTable {
                filename_names: config.filename_names.clone(),
                text_names: config.text_names.clone(),
            },
        }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn classify(&self, text: &str, record: &FileRecord) -> Classification {
        let signals = Signals::new(text, record, &self.names);
        let reasoning_tags = vec![
            "Content match".to_string(),
            format!("Name detected: {}", signals.detected_name),
        ];

        match self.rules.iter().find(|rule| (rule.matches)(&signals)) {
            Some(rule) => Classification {
                category: rule.category,
                subfolder: rule.subfolder_for(&signals),
                confidence: rule.confidence,
                reasoning_tags,
            },
            None => Classification {
                category: Category::Miscellaneous,
                subfolder: "Uncategorized".to_string(),
                confidence: 40,
                reasoning_tags,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(filename: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/data").join(filename),
            filename: filename.to_string(),
            size: 0,
            modified: Utc::now(),
            file_type: filename.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default(),
        }
    }

    #[test]
    fn test_rules_sorted_by_priority() {
        let classifier = Classifier::default();
        let order: Vec<Category> = classifier.rules().iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                Category::Career,
                Category::Academic,
                Category::Identity,
                Category::Financial,
                Category::Projects
            ]
        );
    }

    #[test]
    fn test_name_detection_prefers_filename() {
        let classifier = Classifier::default();
        let result = classifier.classify("Bala Chandra\nsummary", &record("ashok_passport.jpg"));
        assert_eq!(result.category, Category::Identity);
        assert_eq!(result.subfolder, "Ashok");
    }

    #[test]
    fn test_name_detection_only_scans_text_head() {
        let classifier = Classifier::default();
        let far = format!("{}bala chandra", "x".repeat(250));
        let result = classifier.classify(&far, &record("passport_scan.jpg"));
        assert_eq!(result.subfolder, "General");

        let near = "Bala Chandra passport copy";
        let result = classifier.classify(near, &record("scan.jpg"));
        assert_eq!(result.subfolder, "Bala");
    }

    #[test]
    fn test_custom_rule_extends_table() {
        fn is_medical(s: &Signals) -> bool {
            s.combined.contains("prescription")
        }
        let mut rules = default_rules();
        rules.push(CategoryRule {
            category: Category::Miscellaneous,
            priority: 10,
            matches: is_medical,
            subfolder: SubfolderRule::Fixed("Medical"),
            confidence: 70,
        });
        let classifier = Classifier::with_rules(&ClassifierConfig::default(), rules);

        let result = classifier.classify("prescription refill", &record("rx.txt"));
        assert_eq!(result.subfolder, "Medical");
        assert_eq!(result.confidence, 70);
    }
}
