//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Board dimensions
pub const BOARD_WIDTH: u8 = 10;
pub const BOARD_HEIGHT: u8 = 20;

/// Game timing constants (in milliseconds)
pub const TICK_MS: u32 = 16;
pub const BASE_DROP_MS: u32 = 1000;
pub const DROP_MS_PER_LEVEL: u32 = 80;
pub const DROP_MS_FLOOR: u32 = 120;
/// Fixed window for line-clear and star-explosion effects.
pub const EFFECT_WINDOW_MS: u32 = 1000;
/// Fixed window for the companion-pet eat event.
pub const PET_EAT_WINDOW_MS: u32 = 800;
/// Level timer: 90 seconds, plus 15 per hourglass owned.
pub const LEVEL_TIME_LIMIT_MS: u32 = 90_000;
pub const HOURGLASS_BONUS_MS: u32 = 15_000;

/// Chance of a merged cell being marked, per owned marker card.
pub const MARK_CHANCE_PER_CARD: f64 = 0.05;
/// Anti-streak weight factor once a shape has repeated twice.
pub const STREAK_PENALTY: f64 = 0.05;
/// Starting weight for each of the four colors.
pub const BASE_COLOR_WEIGHT: f64 = 100.0;
/// Weight added to a color per matching D-card acquisition.
pub const COLOR_WEIGHT_BOOST: f64 = 10.0;

/// Block colors. The index order matters: color weights, per-color
/// tallies and card effects all address colors by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Orange,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Orange];

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Blue => 2,
            Color::Orange => 3,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Orange => "orange",
        }
    }
}

/// Tetromino shape kinds, ids 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    O,
    T,
    J,
    L,
    S,
    Z,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::J,
        ShapeKind::L,
        ShapeKind::S,
        ShapeKind::Z,
    ];

    pub fn id(self) -> u8 {
        match self {
            ShapeKind::I => 1,
            ShapeKind::O => 2,
            ShapeKind::T => 3,
            ShapeKind::J => 4,
            ShapeKind::L => 5,
            ShapeKind::S => 6,
            ShapeKind::Z => 7,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(ShapeKind::I),
            2 => Some(ShapeKind::O),
            3 => Some(ShapeKind::T),
            4 => Some(ShapeKind::J),
            5 => Some(ShapeKind::L),
            6 => Some(ShapeKind::S),
            7 => Some(ShapeKind::Z),
            _ => None,
        }
    }
}

/// One board cell. A landed cell remembers its color, the shape it came
/// from, and whether it was marked on merge. Encoding is lossless by
/// construction (no packed magic numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied {
        color: Color,
        shape: ShapeKind,
        marked: bool,
    },
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_marked(self) -> bool {
        matches!(self, Cell::Occupied { marked: true, .. })
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Occupied { color, .. } => Some(color),
        }
    }
}

/// Card categories. A–D appear in random draws; E (marker cards) exists
/// and is fully functional but is only ever granted explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    A,
    B,
    C,
    D,
    E,
}

impl Category {
    pub const DRAWABLE: [Category; 4] = [Category::A, Category::B, Category::C, Category::D];
    pub const ALL: [Category; 5] = [
        Category::A,
        Category::B,
        Category::C,
        Category::D,
        Category::E,
    ];

    pub fn as_char(self) -> char {
        match self {
            Category::A => 'A',
            Category::B => 'B',
            Category::C => 'C',
            Category::D => 'D',
            Category::E => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Category::A),
            'B' => Some(Category::B),
            'C' => Some(Category::C),
            'D' => Some(Category::D),
            'E' => Some(Category::E),
            _ => None,
        }
    }
}

/// A validated card identifier, constructed once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardId {
    pub category: Category,
    pub number: u8,
    pub upgraded: bool,
}

impl CardId {
    pub fn new(category: Category, number: u8) -> Option<Self> {
        if (1..=4).contains(&number) {
            Some(Self {
                category,
                number,
                upgraded: false,
            })
        } else {
            None
        }
    }

    /// Parse a free-form id like `A1` or `A+1`. Anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let category = Category::from_char(chars.next()?)?;
        let mut next = chars.next()?;
        let mut upgraded = false;
        if next == '+' {
            upgraded = true;
            next = chars.next()?;
        }
        if chars.next().is_some() {
            return None;
        }
        let number = next.to_digit(10)? as u8;
        if !(1..=4).contains(&number) {
            return None;
        }
        Some(Self {
            category,
            number,
            upgraded,
        })
    }

    /// The (category, number) pair, ignoring the upgrade flag.
    pub fn base(self) -> (Category, u8) {
        (self.category, self.number)
    }

    pub fn upgraded(self) -> Self {
        Self {
            upgraded: true,
            ..self
        }
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.upgraded {
            write!(f, "{}+{}", self.category.as_char(), self.number)
        } else {
            write!(f, "{}{}", self.category.as_char(), self.number)
        }
    }
}

/// Consumable items sold at shop tier 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    IronSword,
    IronShield,
    GemPendant,
    ValuableEarring,
    HorrorMask,
    RareCloak,
    ShopCard,
    GoldenChalice,
    HopeStaff,
    LuckyCat,
    Hourglass,
    Banana,
}

impl ItemKind {
    pub const ALL: [ItemKind; 12] = [
        ItemKind::IronSword,
        ItemKind::IronShield,
        ItemKind::GemPendant,
        ItemKind::ValuableEarring,
        ItemKind::HorrorMask,
        ItemKind::RareCloak,
        ItemKind::ShopCard,
        ItemKind::GoldenChalice,
        ItemKind::HopeStaff,
        ItemKind::LuckyCat,
        ItemKind::Hourglass,
        ItemKind::Banana,
    ];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&it| it == self).unwrap_or(0)
    }

    pub fn price(self) -> u32 {
        3
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::IronSword => "iron sword",
            ItemKind::IronShield => "iron shield",
            ItemKind::GemPendant => "gem pendant",
            ItemKind::ValuableEarring => "valuable earring",
            ItemKind::HorrorMask => "horror mask",
            ItemKind::RareCloak => "rare cloak",
            ItemKind::ShopCard => "shop membership card",
            ItemKind::GoldenChalice => "golden chalice",
            ItemKind::HopeStaff => "hope staff",
            ItemKind::LuckyCat => "lucky cat",
            ItemKind::Hourglass => "hourglass",
            ItemKind::Banana => "banana",
        }
    }
}

/// Player characters and their passive effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Character {
    /// Extra max HP; heals after two consecutive level clears.
    Superman,
    /// May skip the reward card for +2 coins.
    Cowboy,
    /// Star explosion threshold 35 instead of 45, +1 coin per explosion.
    Hunter,
}

impl Character {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "superman" => Some(Character::Superman),
            "cowboy" => Some(Character::Cowboy),
            "hunter" => Some(Character::Hunter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Character::Superman => "superman",
            Character::Cowboy => "cowboy",
            Character::Hunter => "hunter",
        }
    }

    pub fn explosion_threshold(self) -> u32 {
        match self {
            Character::Hunter => 35,
            _ => 45,
        }
    }
}

/// A pre-purchased guarantee that a chosen category or number appears in
/// the next card draw (reward or shop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishKind {
    Category(Category),
    Number(u8),
}

/// Discrete input events pushed into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Pause,
    /// Sniper targeting at board cell coordinates.
    Target { x: i8, y: i8 },
    /// Pick one of the offered reward / pre-start cards.
    PickCard(usize),
    /// Skip the reward card for coins (cowboy only).
    SkipReward,
    PickTask(usize),
    EnterShop,
    LeaveShop,
    NextLevel,
    BuyCard(usize),
    BuyItem,
    /// Sell the most recently acquired card back for 1 coin.
    SellCard,
    UpgradeShop,
    Reroll,
    Wish(WishKind),
    /// Resolve a suspended abundance choice (0 or 1).
    ResolveAbundance(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_id_parse() {
        assert_eq!(
            CardId::parse("A1"),
            Some(CardId {
                category: Category::A,
                number: 1,
                upgraded: false
            })
        );
        assert_eq!(
            CardId::parse("E+4"),
            Some(CardId {
                category: Category::E,
                number: 4,
                upgraded: true
            })
        );
        assert_eq!(CardId::parse("A5"), None);
        assert_eq!(CardId::parse("F1"), None);
        assert_eq!(CardId::parse("A"), None);
        assert_eq!(CardId::parse("A12"), None);
        assert_eq!(CardId::parse(""), None);
        assert_eq!(CardId::parse("A+"), None);
    }

    #[test]
    fn test_card_id_roundtrip() {
        for s in ["A1", "B+3", "D4", "E2"] {
            let card = CardId::parse(s).unwrap();
            assert_eq!(card.to_string(), s);
        }
    }

    #[test]
    fn test_cell_encoding_lossless() {
        let cell = Cell::Occupied {
            color: Color::Blue,
            shape: ShapeKind::T,
            marked: true,
        };
        assert_eq!(cell.color(), Some(Color::Blue));
        assert!(cell.is_marked());
        assert!(!cell.is_empty());
        assert!(Cell::Empty.is_empty());
        assert_eq!(Cell::Empty.color(), None);
    }

    #[test]
    fn test_shape_ids() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ShapeKind::from_id(0), None);
        assert_eq!(ShapeKind::from_id(8), None);
    }

    #[test]
    fn test_explosion_threshold() {
        assert_eq!(Character::Hunter.explosion_threshold(), 35);
        assert_eq!(Character::Superman.explosion_threshold(), 45);
        assert_eq!(Character::Cowboy.explosion_threshold(), 45);
    }
}
