//! Locale-specific wording for everything the bot says.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported conversation locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Japanese,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Self::English),
            "ja" | "ja-jp" | "japanese" => Ok(Self::Japanese),
            other => Err(format!("unsupported locale '{other}' (expected en or ja)")),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::English => write!(f, "en"),
            Self::Japanese => write!(f, "ja"),
        }
    }
}

/// Message catalog for one locale.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn ask_name(&self) -> String {
        match self.locale {
            Locale::English => "What's your name?".to_string(),
            Locale::Japanese => "名前は？".to_string(),
        }
    }

    pub fn thanks_name(&self, name: &str) -> String {
        match self.locale {
            Locale::English => format!("Thanks, {name}!"),
            Locale::Japanese => format!("ありがと！{name}！！"),
        }
    }

    pub fn ask_age_consent(&self) -> String {
        match self.locale {
            Locale::English => "Would you tell me your age?".to_string(),
            Locale::Japanese => "年齢教えてくれる？".to_string(),
        }
    }

    pub fn ask_age(&self) -> String {
        match self.locale {
            Locale::English => "Thank you! Please enter your age.".to_string(),
            Locale::Japanese => "ありがとう！年齢入れて！".to_string(),
        }
    }

    pub fn age_withheld(&self) -> String {
        match self.locale {
            Locale::English => "How mysterious!".to_string(),
            Locale::Japanese => "ミステリアスなんだね！！".to_string(),
        }
    }

    pub fn age_ack(&self, years: i64) -> String {
        match self.locale {
            Locale::English => format!("So you're {years} years old!"),
            Locale::Japanese => format!("{years} 歳なんだね！！"),
        }
    }

    pub fn ask_correct(&self) -> String {
        match self.locale {
            Locale::English => "Is this correct?".to_string(),
            Locale::Japanese => "あってる？".to_string(),
        }
    }

    pub fn summary_withheld(&self, name: &str) -> String {
        match self.locale {
            Locale::English => format!("You're the mysterious {name}!"),
            Locale::Japanese => format!("ミステリアスな {name} さんだね！"),
        }
    }

    pub fn summary(&self, name: &str, years: i64) -> String {
        match self.locale {
            Locale::English => format!("You're {name}, {years} years old!"),
            Locale::Japanese => format!("{years} 歳の {name} さんだね！"),
        }
    }

    pub fn forget(&self) -> String {
        match self.locale {
            Locale::English => "Then I'll forget about you instead of remembering!".to_string(),
            Locale::Japanese => "じゃぁ、君のことは覚えないで忘れておくね！".to_string(),
        }
    }

    pub fn event_detected(&self, kind: &str) -> String {
        format!("{kind} event detected")
    }

    pub fn apology(&self) -> String {
        match self.locale {
            Locale::English => "Sorry, it looks like something went wrong.".to_string(),
            Locale::Japanese => "ごめんね、何かがうまくいかなかったみたい。".to_string(),
        }
    }

    pub fn reprompt_text(&self) -> String {
        match self.locale {
            Locale::English => "Please provide a value.".to_string(),
            Locale::Japanese => "値を入力してね。".to_string(),
        }
    }

    pub fn reprompt_integer(&self) -> String {
        match self.locale {
            Locale::English => "Please enter a whole number.".to_string(),
            Locale::Japanese => "数字で入力してね。".to_string(),
        }
    }

    pub fn reprompt_confirm(&self, yes: &[&str], no: &[&str]) -> String {
        match self.locale {
            Locale::English => format!(
                "Please answer yes or no (yes: {}; no: {}).",
                yes.join(", "),
                no.join(", ")
            ),
            Locale::Japanese => format!(
                "「はい」か「いいえ」で答えてね（はい: {} / いいえ: {}）。",
                yes.join("、"),
                no.join("、")
            ),
        }
    }

    /// Accepted yes/no vocabulary, lowercase.
    pub fn confirm_vocabulary(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self.locale {
            Locale::English => (EN_YES, EN_NO),
            Locale::Japanese => (JA_YES, JA_NO),
        }
    }
}

const EN_YES: &[&str] = &["yes", "y", "yeah", "yep", "sure", "ok", "true"];
const EN_NO: &[&str] = &["no", "n", "nope", "nah", "false"];
const JA_YES: &[&str] = &["はい", "うん", "ええ", "yes", "y"];
const JA_NO: &[&str] = &["いいえ", "いや", "ううん", "no", "n"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parsing() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::English);
        assert_eq!(" JA ".parse::<Locale>().unwrap(), Locale::Japanese);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for locale in [Locale::English, Locale::Japanese] {
            assert_eq!(locale.to_string().parse::<Locale>().unwrap(), locale);
        }
    }

    #[test]
    fn summaries_differ_for_withheld_age() {
        let catalog = Catalog::new(Locale::English);
        let withheld = catalog.summary_withheld("Aki");
        assert!(withheld.contains("Aki"));
        assert!(!withheld.chars().any(|c| c.is_ascii_digit()));
        assert!(catalog.summary("Ken", 5).contains('5'));
    }

    #[test]
    fn japanese_catalog_wording() {
        let catalog = Catalog::new(Locale::Japanese);
        assert_eq!(catalog.ask_name(), "名前は？");
        assert_eq!(catalog.summary("Ken", 5), "5 歳の Ken さんだね！");
    }
}
