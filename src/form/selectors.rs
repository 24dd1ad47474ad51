/// Selectors for the booking form and its widgets.
///
/// The form mixes a site-specific city suggestion list with Ant Design
/// dropdowns and date pickers; several shapes can show up for one control.
use crate::browser::Locator;

pub struct EhiSelectors;

impl EhiSelectors {
    pub const PICKUP_CITY_ID: &'static str = "pickupcity";
    pub const RETURN_CITY_ID: &'static str = "returncity";
    pub const PICKUP_DATE_ID: &'static str = "pickupdate";
    pub const RETURN_DATE_ID: &'static str = "returndate";

    pub const PICKUP_DATE_LABEL: &'static str = "取车日期";
    pub const RETURN_DATE_LABEL: &'static str = "还车日期";

    /// Suffix the suggestion list may append to a city name.
    pub const CITY_SUFFIX: &'static str = "市";
    pub const CITY_SUGGEST: &'static str = ".city-search";

    pub const GENERIC_DROPDOWNS: &'static [&'static str] = &[
        ".ant-select-dropdown:not(.ant-select-dropdown-hidden)",
        ".ant-cascader-dropdown:not(.ant-cascader-dropdown-hidden)",
        ".ant-dropdown:not(.ant-dropdown-hidden)",
        "[role='listbox']",
    ];

    pub const CONFIRM_LABEL: &'static str = "确定";
    pub const SEARCH_LABEL: &'static str = "查询";
    pub const RESULT_CARD: &'static str = ".cartype-list";
    pub const BOOK_LABEL: &'static str = "预订";
    pub const DAILY_PRICE_LABEL: &'static str = "日均";
}

/// Quotes a value as an XPath string literal, whatever quotes it contains.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn has_class(class: &str) -> String {
    format!(
        "contains(concat(' ', normalize-space(@class), ' '), ' {} ')",
        class
    )
}

const HIDDEN_ANCESTOR: &str = "ancestor::*[contains(@style,'display: none')]";

pub fn field(id: &str) -> Locator {
    Locator::xpath(format!("//*[@id={}]", xpath_literal(id)))
}

pub fn city_suggest() -> Locator {
    Locator::css(EhiSelectors::CITY_SUGGEST)
}

/// Option in the site's own city suggestion list.
pub fn city_suggest_option(text: &str) -> Locator {
    Locator::xpath(format!(
        "(//*[{}])[1]//li[normalize-space(text())={}]",
        has_class("city-search"),
        xpath_literal(text)
    ))
}

pub fn generic_dropdown() -> Locator {
    Locator::css(EhiSelectors::GENERIC_DROPDOWNS.join(", "))
}

/// Option inside any open Ant Design dropdown or listbox.
pub fn generic_dropdown_option(text: &str) -> Locator {
    let open = [
        ("ant-select-dropdown", "ant-select-dropdown-hidden"),
        ("ant-cascader-dropdown", "ant-cascader-dropdown-hidden"),
        ("ant-dropdown", "ant-dropdown-hidden"),
    ]
    .iter()
    .map(|(shown, hidden)| format!("({} and not({}))", has_class(shown), has_class(hidden)))
    .chain(std::iter::once("@role='listbox'".to_string()))
    .collect::<Vec<_>>()
    .join(" or ");

    Locator::xpath(format!(
        "//*[{}]//*[self::div or self::span or self::li or self::a][normalize-space(text())={} and not({})]",
        open,
        xpath_literal(text),
        HIDDEN_ANCESTOR
    ))
}

/// First visible element anywhere whose own text is exactly `text`.
pub fn any_option(text: &str) -> Locator {
    Locator::xpath(format!(
        "(//*[self::li or self::div or self::a or self::span][normalize-space(text())={} and not({})])[1]",
        xpath_literal(text),
        HIDDEN_ANCESTOR
    ))
}

/// Date input located through its visible label, for when the id is missing.
pub fn field_after_label(label: &str) -> Locator {
    Locator::xpath(format!(
        "(//*[contains(text(), {})]/following::input)[1]",
        xpath_literal(label)
    ))
}

/// The picker wrapper around a date input; clicking it opens the overlay.
pub fn picker_wrapper(input: &Locator) -> Option<Locator> {
    match input {
        Locator::XPath(expr) => Some(Locator::xpath(format!(
            "({})/ancestor::div[contains(@class,'ant-picker')][1]",
            expr
        ))),
        Locator::Css(_) => None,
    }
}

/// The most recently opened date-picker overlay.
pub fn open_picker() -> Locator {
    Locator::xpath(open_picker_xpath())
}

fn open_picker_xpath() -> String {
    format!(
        "(//div[{} and not({})])[last()]",
        has_class("ant-picker-dropdown"),
        has_class("ant-picker-dropdown-hidden")
    )
}

/// Calendar cell whose title is the ISO date.
pub fn calendar_cell(iso_date: &str) -> Locator {
    Locator::xpath(format!(
        "{}//*[{} and @title={}]",
        open_picker_xpath(),
        has_class("ant-picker-cell"),
        xpath_literal(iso_date)
    ))
}

pub fn calendar_next_month() -> Locator {
    Locator::xpath(format!(
        "{}//*[{}]",
        open_picker_xpath(),
        has_class("ant-picker-header-next-btn")
    ))
}

pub fn calendar_confirm() -> Locator {
    Locator::xpath(format!(
        "{}//button[normalize-space(text())={}]",
        open_picker_xpath(),
        xpath_literal(EhiSelectors::CONFIRM_LABEL)
    ))
}

/// Search button by role and label, tolerant of spacing inside the label ("查 询").
pub fn search_by_role() -> Locator {
    Locator::xpath(format!(
        "//*[self::button or @role='button'][contains(translate(normalize-space(.), ' \u{3000}', ''), {})]",
        xpath_literal(EhiSelectors::SEARCH_LABEL)
    ))
}

pub fn search_by_partial_text() -> Locator {
    Locator::xpath("//button[contains(., '查')]")
}

pub fn search_by_text() -> Locator {
    text_contains(EhiSelectors::SEARCH_LABEL)
}

pub fn result_cards() -> Locator {
    Locator::css(EhiSelectors::RESULT_CARD)
}

pub fn text_contains(text: &str) -> Locator {
    Locator::xpath(format!("//*[contains(text(), {})]", xpath_literal(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xpath_literals_survive_quotes() {
        assert_eq!(xpath_literal("敦煌"), "'敦煌'");
        assert_eq!(xpath_literal("O'Hare"), "\"O'Hare\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[test]
    fn calendar_cell_targets_title() {
        let Locator::XPath(expr) = calendar_cell("2025-10-04") else {
            panic!("cell locator should be xpath");
        };
        assert!(expr.contains("@title='2025-10-04'"));
        assert!(expr.starts_with("(//div["));
    }

    #[test]
    fn wrapper_is_derived_from_input() {
        let wrapper = picker_wrapper(&field("pickupdate")).unwrap();
        assert_eq!(
            wrapper,
            Locator::xpath("(//*[@id='pickupdate'])/ancestor::div[contains(@class,'ant-picker')][1]")
        );
    }
}
