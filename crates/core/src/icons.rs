//! Icon lookup for symbols and emotions.
//!
//! Each lookup is an ordered rule table evaluated first-match-wins:
//! exact keyword, then keyword/label containment in either direction (in
//! keyword order), then hand-picked prefix/substring fallbacks, then a
//! default. The tables are built once and shared.

use std::sync::LazyLock;

/// Icon used when no symbol rule matches.
pub const DEFAULT_SYMBOL_ICON: &str = "🔮";

/// Icon used when no emotion rule matches.
pub const DEFAULT_EMOTION_ICON: &str = "💭";

/// How a rule tests the normalized (trimmed, lower-cased) label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Label equals the keyword.
    Exact(&'static str),
    /// Label contains the keyword or the keyword contains the label.
    Overlaps(&'static str),
    StartsWith(&'static str),
    Contains(&'static str),
}

impl Predicate {
    fn matches(self, label: &str) -> bool {
        match self {
            Predicate::Exact(k) => label == k,
            Predicate::Overlaps(k) => label.contains(k) || k.contains(label),
            Predicate::StartsWith(p) => label.starts_with(p),
            Predicate::Contains(s) => label.contains(s),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IconRule {
    pub predicate: Predicate,
    pub icon: &'static str,
}

/// An ordered rule list plus its default.
#[derive(Debug)]
pub struct IconTable {
    rules: Vec<IconRule>,
    default: &'static str,
}

impl IconTable {
    /// Build a table from a keyword list and trailing fallback rules.
    ///
    /// Every keyword yields an `Exact` rule; a second pass over the same
    /// keywords yields `Overlaps` rules, so exact hits always win over
    /// partial ones.
    pub fn new(
        keywords: &[(&'static str, &'static str)],
        fallbacks: &[IconRule],
        default: &'static str,
    ) -> Self {
        let exact = keywords.iter().map(|&(k, icon)| IconRule {
            predicate: Predicate::Exact(k),
            icon,
        });
        let overlaps = keywords.iter().map(|&(k, icon)| IconRule {
            predicate: Predicate::Overlaps(k),
            icon,
        });
        Self {
            rules: exact.chain(overlaps).chain(fallbacks.iter().copied()).collect(),
            default,
        }
    }

    pub fn lookup(&self, label: &str) -> &'static str {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return self.default;
        }
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(&label))
            .map_or(self.default, |rule| rule.icon)
    }
}

/// Icon for a dream symbol.
pub fn symbol_icon(symbol: &str) -> &'static str {
    SYMBOL_TABLE.lookup(symbol)
}

/// Icon for an emotion name.
pub fn emotion_icon(emotion: &str) -> &'static str {
    EMOTION_TABLE.lookup(emotion)
}

static SYMBOL_TABLE: LazyLock<IconTable> =
    LazyLock::new(|| IconTable::new(SYMBOL_KEYWORDS, &symbol_fallbacks(), DEFAULT_SYMBOL_ICON));

static EMOTION_TABLE: LazyLock<IconTable> = LazyLock::new(|| {
    IconTable::new(EMOTION_KEYWORDS, &emotion_fallbacks(), DEFAULT_EMOTION_ICON)
});

const fn starts(prefix: &'static str, icon: &'static str) -> IconRule {
    IconRule {
        predicate: Predicate::StartsWith(prefix),
        icon,
    }
}

const fn has(needle: &'static str, icon: &'static str) -> IconRule {
    IconRule {
        predicate: Predicate::Contains(needle),
        icon,
    }
}

fn symbol_fallbacks() -> [IconRule; 19] {
    [
        starts("lib", "📚"),
        has("book", "📚"),
        starts("know", "🧠"),
        has("learn", "🧠"),
        starts("self", "🔍"),
        has("discover", "🔍"),
        starts("transform", "🦋"),
        has("change", "🦋"),
        starts("uncertain", "❓"),
        has("unknown", "❓"),
        starts("o", "🌊"),
        starts("s", "⭐"),
        starts("w", "💧"),
        starts("f", "🔥"),
        starts("d", "🌙"),
        starts("l", "💡"),
        starts("h", "🏠"),
        starts("m", "🌙"),
        starts("t", "🌳"),
    ]
}

fn emotion_fallbacks() -> [IconRule; 14] {
    [
        has("curious", "🔍"),
        has("wonder", "🔍"),
        has("happy", "😄"),
        has("joy", "😄"),
        has("sad", "😢"),
        has("sorrow", "😢"),
        has("angry", "😠"),
        has("rage", "😠"),
        has("fear", "😨"),
        has("scared", "😨"),
        has("love", "❤️"),
        has("affection", "❤️"),
        has("confus", "😕"),
        has("uncertain", "😕"),
    ]
}

const SYMBOL_KEYWORDS: &[(&str, &str)] = &[
    // Knowledge & learning
    ("library", "📚"),
    ("libraries", "📚"),
    ("book", "📖"),
    ("books", "📖"),
    ("page", "📄"),
    ("pages", "📄"),
    ("title", "📝"),
    ("titles", "📝"),
    ("knowledge", "🧠"),
    ("know", "🧠"),
    ("learning", "📚"),
    ("learn", "📚"),
    ("study", "📚"),
    ("education", "🎓"),
    ("school", "🏫"),
    ("wisdom", "🦉"),
    ("wise", "🦉"),
    // Self & growth
    ("self-discovery", "🔍"),
    ("self", "🪞"),
    ("discovery", "🔍"),
    ("transformation", "🦋"),
    ("transform", "🦋"),
    ("change", "🔄"),
    ("growth", "🌱"),
    ("grow", "🌱"),
    ("journey", "🗺️"),
    ("path", "🛤️"),
    // Uncertainty
    ("uncertainty", "❓"),
    ("uncertain", "❓"),
    ("unknown", "❓"),
    ("confusion", "😕"),
    ("confused", "😕"),
    ("doubt", "🤔"),
    ("question", "❓"),
    // Nature
    ("ocean", "🌊"),
    ("sea", "🌊"),
    ("water", "💧"),
    ("wave", "🌊"),
    ("shark", "🦈"),
    ("fish", "🐟"),
    ("whale", "🐋"),
    ("dolphin", "🐬"),
    ("bird", "🐦"),
    ("eagle", "🦅"),
    ("owl", "🦉"),
    ("crow", "🐦‍⬛"),
    ("tree", "🌳"),
    ("forest", "🌲"),
    ("flower", "🌸"),
    ("rose", "🌹"),
    ("moon", "🌙"),
    ("sun", "☀️"),
    ("star", "⭐"),
    ("sky", "☁️"),
    ("fire", "🔥"),
    ("flame", "🔥"),
    ("lightning", "⚡"),
    ("storm", "⛈️"),
    ("mountain", "⛰️"),
    ("hill", "🏔️"),
    ("valley", "🏞️"),
    // Buildings & structures
    ("house", "🏠"),
    ("building", "🏢"),
    ("door", "🚪"),
    ("window", "🪟"),
    ("car", "🚗"),
    ("road", "🛣️"),
    ("bridge", "🌉"),
    // Animals
    ("snake", "🐍"),
    ("dragon", "🐉"),
    ("tiger", "🐅"),
    ("lion", "🦁"),
    ("cat", "🐱"),
    ("dog", "🐶"),
    ("wolf", "🐺"),
    ("bear", "🐻"),
    // Objects
    ("key", "🗝️"),
    ("lock", "🔒"),
    ("gate", "🚧"),
    ("mirror", "🪞"),
    ("glass", "🪟"),
    ("crystal", "💎"),
    ("letter", "✉️"),
    ("heart", "❤️"),
    ("love", "💕"),
    ("kiss", "💋"),
    ("eye", "👁️"),
    ("vision", "👁️"),
    ("hand", "✋"),
    ("finger", "👉"),
    ("touch", "✋"),
    ("foot", "🦶"),
    ("walk", "🚶"),
    ("run", "🏃"),
    ("flight", "✈️"),
    ("fly", "🕊️"),
    ("wing", "🪽"),
    ("death", "💀"),
    ("skull", "💀"),
    ("grave", "🪦"),
    ("baby", "👶"),
    ("child", "🧒"),
    ("person", "👤"),
    ("money", "💰"),
    ("coin", "🪙"),
    ("gold", "🪙"),
    ("food", "🍽️"),
    ("apple", "🍎"),
    ("bread", "🍞"),
    ("knife", "🔪"),
    ("sword", "⚔️"),
    ("weapon", "🗡️"),
    ("crown", "👑"),
    ("king", "👑"),
    ("queen", "👸"),
    ("ring", "💍"),
    ("jewelry", "💎"),
    ("diamond", "💎"),
    ("clock", "🕐"),
    ("time", "⏰"),
    ("hourglass", "⏳"),
    ("light", "💡"),
    ("lamp", "🪔"),
    ("candle", "🕯️"),
    ("dark", "🌑"),
    ("shadow", "🌑"),
    ("night", "🌙"),
    ("rain", "🌧️"),
    ("snow", "❄️"),
    ("ice", "🧊"),
    ("wind", "💨"),
    ("air", "💨"),
    ("breeze", "💨"),
    ("earth", "🌍"),
    ("ground", "🌍"),
    ("soil", "🌱"),
    ("blood", "🩸"),
    ("red", "🔴"),
    ("wound", "🩹"),
];

const EMOTION_KEYWORDS: &[(&str, &str)] = &[
    ("curiosity", "🔍"),
    ("curious", "🔍"),
    ("wonder", "✨"),
    ("wondering", "✨"),
    ("confusion", "😕"),
    ("confused", "😕"),
    ("anticipation", "⏳"),
    ("anticipate", "⏳"),
    ("fear", "😨"),
    ("scared", "😱"),
    ("afraid", "😨"),
    ("anxiety", "😰"),
    ("anxious", "😰"),
    ("worried", "😰"),
    ("joy", "😄"),
    ("joyful", "😄"),
    ("happiness", "😊"),
    ("happy", "😊"),
    ("sadness", "😢"),
    ("sad", "😢"),
    ("anger", "😠"),
    ("angry", "😠"),
    ("mad", "😡"),
    ("peace", "☮️"),
    ("peaceful", "☮️"),
    ("calm", "😌"),
    ("excitement", "🤩"),
    ("excited", "🤩"),
    ("love", "❤️"),
    ("loving", "❤️"),
    ("surprise", "😲"),
    ("surprised", "😲"),
    ("disgust", "🤢"),
    ("disgusted", "🤢"),
    ("shame", "😳"),
    ("ashamed", "😳"),
    ("guilt", "😔"),
    ("guilty", "😔"),
    ("hope", "🌟"),
    ("hopeful", "🌟"),
    ("despair", "😞"),
    ("desperate", "😞"),
    ("loneliness", "😔"),
    ("lonely", "😔"),
    ("contentment", "😌"),
    ("content", "😌"),
    ("gratitude", "🙏"),
    ("grateful", "🙏"),
    ("pride", "😎"),
    ("proud", "😎"),
    ("envy", "😒"),
    ("jealous", "😒"),
    ("relief", "😌"),
    ("relieved", "😌"),
    ("embarrassment", "😳"),
    ("embarrassed", "😳"),
];
