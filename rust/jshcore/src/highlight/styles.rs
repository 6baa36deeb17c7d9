//! Default stylesheet for markers

use std::fmt::Write;

use crate::scanner::category::Category;

/// Shared rules for every marker, including the hover tooltip box
const BASE_RULES: &str = "\
.jsh-mark {
  position: relative;
  outline-width: 1px;
  outline-style: solid;
  border-radius: 0.25rem;
  cursor: help;
}
.jsh-mark::before {
  display: none;
  position: absolute;
  bottom: 1.25rem;
  left: 0;
  width: 150px;
  padding: 0.25rem;
  font-size: 12px;
  font-weight: normal;
  line-height: 1.1;
  color: hsl(50, 60%, 40%);
  background-color: hsl(50, 95%, 90%);
  border: 1px solid hsl(50, 60%, 70%);
  border-radius: 0.5rem;
  box-shadow: 0 0.15rem 0.5rem rgba(45,45,45,0.15);
}
.jsh-mark:hover::before {
  display: block;
}
";

/// Background and outline tones for one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub hue: u16,
    /// (saturation %, lightness %)
    pub background: (u8, u8),
    pub outline: (u8, u8),
    pub alpha: f32,
}

impl Palette {
    pub fn for_category(category: Category) -> Self {
        let hue = category.hue();
        let (background, outline, alpha) = match category {
            Category::AlwaysHighlight => ((100, 70), (100, 50), 0.5),
            Category::Location => ((100, 80), (90, 60), 0.75),
            Category::SearchTerm => ((100, 90), (90, 75), 0.75),
            Category::Flagged => ((80, 80), (70, 70), 0.75),
            Category::WorkType => ((100, 90), (85, 85), 0.75),
            Category::Currency => ((70, 80), (70, 70), 0.75),
        };
        Self {
            hue,
            background,
            outline,
            alpha,
        }
    }

    fn hsla(&self, (s, l): (u8, u8), alpha: f32) -> String {
        format!("hsla({},{}%,{}%,{})", self.hue, s, l, alpha)
    }
}

/// CSS string literal content; tooltips never carry newlines
fn css_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Rules for a single category
pub fn category_rules(category: Category) -> String {
    let class = category.css_class();
    let palette = Palette::for_category(category);
    let mut css = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        css,
        ".{} {{background-color:{}; outline-color:{};}}",
        class,
        palette.hsla(palette.background, palette.alpha),
        palette.hsla(palette.outline, palette.alpha)
    );
    let _ = writeln!(
        css,
        ".{}:hover {{outline-color:{};}}",
        class,
        palette.hsla(palette.outline, 1.0)
    );
    let _ = writeln!(
        css,
        ".{}::before {{content:'{}';}}",
        class,
        css_string(category.tooltip())
    );
    css
}

/// The complete default stylesheet
pub fn stylesheet() -> String {
    let mut css = String::from(BASE_RULES);
    for category in Category::ALL {
        css.push('\n');
        css.push_str(&category_rules(category));
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_rules() {
        let css = stylesheet();
        for category in Category::ALL {
            assert!(css.contains(&format!(".{} {{", category.css_class())));
            assert!(css.contains(category.tooltip()));
        }
    }

    #[test]
    fn test_flagged_rules() {
        let rules = category_rules(Category::Flagged);
        assert!(rules.starts_with(
            ".jsh-flagged {background-color:hsla(0,80%,80%,0.75); outline-color:hsla(0,70%,70%,0.75);}"
        ));
        assert!(rules.contains(".jsh-flagged:hover {outline-color:hsla(0,70%,70%,1);}"));
    }

    #[test]
    fn test_css_string_escapes_quotes() {
        assert_eq!(css_string("it's"), "it\\'s");
    }
}
