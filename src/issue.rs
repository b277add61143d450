use serde::Deserialize;

/// How the checking service classified a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Misspelling,
    GrammarOrOther,
}

impl IssueType {
    pub fn from_service(issue_type: &str) -> Self {
        if issue_type.eq_ignore_ascii_case("misspelling") {
            IssueType::Misspelling
        } else {
            IssueType::GrammarOrOther
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueType::Misspelling => "Spelling",
            IssueType::GrammarOrOther => "Grammar",
        }
    }

    /// Class name used by the HTML overlay and panel.
    pub fn css_class(&self) -> &'static str {
        match self {
            IssueType::Misspelling => "issue-spelling",
            IssueType::GrammarOrOther => "issue-grammar",
        }
    }
}

/// Excerpt of the checked text around a match, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueContext {
    pub text: String,
    pub offset: usize,
    pub length: usize,
}

/// A single spelling or grammar problem. `offset` and `length` are UTF-16
/// units into the text that was sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub offset: usize,
    pub length: usize,
    pub issue_type: IssueType,
    pub message: String,
    pub short_message: Option<String>,
    pub rule_id: Option<String>,
    pub category: Option<String>,
    pub context: IssueContext,
    pub replacements: Vec<String>,
}

impl Issue {
    pub fn is_misspelling(&self) -> bool {
        self.issue_type == IssueType::Misspelling
    }

    /// Short headline when the service gives one, the full message otherwise.
    pub fn headline(&self) -> &str {
        self.short_message.as_deref().unwrap_or(&self.message)
    }

    /// "Category / RULE_ID", either part when only one is known.
    pub fn rule_label(&self) -> Option<String> {
        match (&self.category, &self.rule_id) {
            (Some(category), Some(rule)) => Some(format!("{} / {}", category, rule)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

/// Matches from the latest completed check, in service order. The position
/// of an issue in this set is its identifier for both rendered views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSet {
    issues: Vec<Issue>,
}

impl IssueSet {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn get(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    pub fn misspelling_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_misspelling()).count()
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }
}

impl From<Vec<Issue>> for IssueSet {
    fn from(issues: Vec<Issue>) -> Self {
        Self::new(issues)
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

// Wire format of the checking service response.

#[derive(Debug, Deserialize)]
struct CheckResponseBody {
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatch {
    offset: usize,
    length: usize,
    message: String,
    #[serde(default)]
    short_message: Option<String>,
    rule: WireRule,
    context: WireContext,
    #[serde(default)]
    replacements: Vec<WireReplacement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRule {
    #[serde(default)]
    id: Option<String>,
    issue_type: String,
    #[serde(default)]
    category: Option<WireCategory>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContext {
    text: String,
    offset: usize,
    length: usize,
}

#[derive(Debug, Deserialize)]
struct WireReplacement {
    value: String,
}

impl WireMatch {
    fn into_issue(self) -> Issue {
        Issue {
            offset: self.offset,
            length: self.length,
            issue_type: IssueType::from_service(&self.rule.issue_type),
            message: self.message,
            short_message: self.short_message.filter(|s| !s.is_empty()),
            rule_id: self.rule.id,
            category: self.rule.category.and_then(|c| c.name.or(c.id)),
            context: IssueContext {
                text: self.context.text,
                offset: self.context.offset,
                length: self.context.length,
            },
            replacements: self.replacements.into_iter().map(|r| r.value).collect(),
        }
    }
}

/// Parse a service response body into issues, keeping service order.
pub fn parse_matches(body: &str) -> serde_json::Result<Vec<Issue>> {
    let response: CheckResponseBody = serde_json::from_str(body)?;
    Ok(response.matches.into_iter().map(WireMatch::into_issue).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an issue whose context is the whole text.
    pub(crate) fn issue(
        text: &str,
        offset: usize,
        length: usize,
        issue_type: IssueType,
        replacements: &[&str],
    ) -> Issue {
        Issue {
            offset,
            length,
            issue_type,
            message: format!("Problem at {}", offset),
            short_message: None,
            rule_id: None,
            category: None,
            context: IssueContext {
                text: text.to_string(),
                offset,
                length,
            },
            replacements: replacements.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_service_response() {
        let body = r#"{
            "software": {"name": "LanguageTool"},
            "matches": [
                {
                    "offset": 2,
                    "length": 3,
                    "message": "Subject-verb agreement",
                    "shortMessage": "",
                    "rule": {"id": "HE_VERB_AGR", "issueType": "grammar", "category": {"id": "GRAMMAR", "name": "Grammar"}},
                    "context": {"text": "I has a dog", "offset": 2, "length": 3},
                    "replacements": [{"value": "have"}]
                },
                {
                    "offset": 8,
                    "length": 3,
                    "message": "Possible spelling mistake found.",
                    "rule": {"issueType": "misspelling"},
                    "context": {"text": "I has a dgo", "offset": 8, "length": 3},
                    "replacements": []
                }
            ]
        }"#;

        let issues = parse_matches(body).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue_type, IssueType::GrammarOrOther);
        assert_eq!(issues[0].replacements, vec!["have".to_string()]);
        assert_eq!(issues[0].short_message, None);
        assert_eq!(issues[0].rule_id.as_deref(), Some("HE_VERB_AGR"));
        assert_eq!(issues[0].category.as_deref(), Some("Grammar"));
        assert_eq!(issues[0].rule_label().as_deref(), Some("Grammar / HE_VERB_AGR"));
        assert_eq!(issues[1].category, None);
        assert_eq!(issues[1].rule_label(), None);
        assert_eq!(issues[1].issue_type, IssueType::Misspelling);
        assert!(issues[1].replacements.is_empty());
        assert_eq!(issues[1].headline(), "Possible spelling mistake found.");
    }

    #[test]
    fn test_headline_prefers_short_message() {
        let mut found = issue("teh", 0, 3, IssueType::Misspelling, &[]);
        found.short_message = Some("Spelling mistake".to_string());
        assert_eq!(found.headline(), "Spelling mistake");
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(parse_matches(r#"{"error": "nope"}"#).is_err());
        assert!(parse_matches("<html>busy</html>").is_err());
    }

    #[test]
    fn test_misspelling_count() {
        let text = "teh cat are";
        let set = IssueSet::new(vec![
            issue(text, 0, 3, IssueType::Misspelling, &["the"]),
            issue(text, 8, 3, IssueType::GrammarOrOther, &["is"]),
        ]);
        assert_eq!(set.misspelling_count(), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(IssueType::from_service("MISSPELLING"), IssueType::Misspelling);
        assert_eq!(IssueType::from_service("typographical"), IssueType::GrammarOrOther);
    }
}
