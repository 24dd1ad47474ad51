/// Brand names the rental site prints in front of model names.
const KNOWN_BRANDS: &[&str] = &[
    "大众", "丰田", "本田", "日产", "别克", "雪佛兰", "福特", "现代", "起亚", "马自达",
    "奥迪", "宝马", "奔驰", "吉利", "长安", "哈弗", "比亚迪", "荣威", "名爵", "传祺",
    "奇瑞", "五菱", "宝骏", "雪铁龙", "标致", "斯柯达", "沃尔沃", "凯迪拉克", "特斯拉",
    "Volkswagen", "VW", "Toyota", "Honda", "Nissan", "Buick", "Chevrolet", "Ford",
    "Hyundai", "Kia", "Mazda", "Audi", "BMW", "Mercedes", "Tesla", "BYD", "Geely",
];

/// Marketing prefixes that the listing may or may not repeat ("新探影" vs "探影").
const MODEL_PREFIXES: &[&str] = &["全新", "新款", "新", "New ", "new "];

/// The target vehicle, decomposed for fuzzy matching against listing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleQuery {
    full: String,
    compact: String,
    brand: Option<String>,
    model: Option<String>,
}

impl VehicleQuery {
    pub fn new(name: &str) -> Self {
        let full = name.trim().to_string();
        let compact: String = full.chars().filter(|c| !c.is_whitespace()).collect();

        let brand = KNOWN_BRANDS
            .iter()
            .find(|b| full.starts_with(**b))
            .map(|b| b.to_string());

        let model = brand.as_deref().and_then(|b| {
            let mut rest = full[b.len()..].trim();
            for prefix in MODEL_PREFIXES {
                if let Some(stripped) = rest.strip_prefix(prefix) {
                    rest = stripped.trim();
                    break;
                }
            }
            let rest: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
            (!rest.is_empty()).then_some(rest)
        });

        Self {
            full,
            compact,
            brand,
            model,
        }
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    /// The name with all whitespace removed.
    pub fn compact(&self) -> &str {
        &self.compact
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    /// Model token with marketing prefixes trimmed.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Brand and model tokens, when the name could be decomposed.
    pub fn tokens(&self) -> Vec<&str> {
        match (self.brand(), self.model()) {
            (Some(b), Some(m)) => vec![b, m],
            _ => Vec::new(),
        }
    }

    /// Tokens every matching block must contain: the decomposed tokens, or
    /// the full name when the name has no known brand.
    pub fn required_keywords(&self) -> Vec<&str> {
        let tokens = self.tokens();
        if tokens.is_empty() {
            vec![self.full()]
        } else {
            tokens
        }
    }

    /// Card-name match: containment of the full name, or all tokens present.
    /// Case is ignored everywhere a name is looked up.
    pub fn matches_name(&self, name: &str) -> bool {
        if self.full.is_empty() {
            return false;
        }
        if contains_ignore_case(name, &self.full) {
            return true;
        }
        let tokens = self.tokens();
        !tokens.is_empty() && tokens.iter().all(|t| contains_ignore_case(name, t))
    }

    pub fn contains_all_keywords(&self, text: &str) -> bool {
        !self.full.is_empty()
            && self
                .required_keywords()
                .iter()
                .all(|k| contains_ignore_case(text, k))
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_brand_and_trimmed_model() {
        let q = VehicleQuery::new(" 大众新探影 ");
        assert_eq!(q.full(), "大众新探影");
        assert_eq!(q.brand(), Some("大众"));
        assert_eq!(q.model(), Some("探影"));
        assert_eq!(q.tokens(), vec!["大众", "探影"]);
    }

    #[test]
    fn latin_names_without_known_brand_stay_whole() {
        let q = VehicleQuery::new("Model X");
        assert_eq!(q.brand(), None);
        assert!(q.tokens().is_empty());
        assert_eq!(q.required_keywords(), vec!["Model X"]);
        assert_eq!(q.compact(), "ModelX");
    }

    #[test]
    fn card_names_match_exactly_or_by_tokens() {
        let q = VehicleQuery::new("大众新探影");
        assert!(q.matches_name("大众新探影 1.5T 自动"));
        assert!(q.matches_name("大众 探影 或同组车型"));
        assert!(!q.matches_name("大众朗逸"));
        assert!(!q.matches_name("丰田卡罗拉"));
    }

    #[test]
    fn plain_names_match_only_by_containment() {
        let q = VehicleQuery::new("Model X");
        assert!(q.matches_name("Tesla Model X Long Range"));
        assert!(!q.matches_name("Model Y"));
    }

    #[test]
    fn matching_ignores_case() {
        let q = VehicleQuery::new("Model X");
        assert!(q.matches_name("MODEL X 豪华版"));
        assert!(q.contains_all_keywords("tesla model x\n¥980/日均"));

        let q = VehicleQuery::new("BMW 3系");
        assert_eq!(q.tokens(), vec!["BMW", "3系"]);
        assert!(q.matches_name("bmw 3系 自动"));
    }

    #[test]
    fn empty_name_never_matches() {
        let q = VehicleQuery::new("   ");
        assert!(!q.matches_name("anything"));
        assert!(!q.contains_all_keywords("anything"));
    }
}
