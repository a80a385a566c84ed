use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ParsePieceSeedError, PieceKind};

/// Supplies the shape of every piece the session spawns.
///
/// The session asks for one kind per spawn and never looks ahead, so a source
/// can be anything from a seeded random generator to a scripted list.
pub trait PieceSource {
    fn next_kind(&mut self) -> PieceKind;
}

impl<S> PieceSource for Box<S>
where
    S: PieceSource + ?Sized,
{
    fn next_kind(&mut self) -> PieceKind {
        self.as_mut().next_kind()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed, written as 32 hex digits. Two sources built from the same
/// seed produce the same sequence of pieces.
///
/// # Example
///
/// ```
/// use rltris_engine::{PieceSeed, PieceSource as _, UniformPieceSource};
///
/// let seed: PieceSeed = "0123456789abcdef0123456789abcdef".parse().unwrap();
/// let mut a = UniformPieceSource::with_seed(seed);
/// let mut b = UniformPieceSource::with_seed(seed);
/// assert_eq!(a.next_kind(), b.next_kind());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Derives the seed of the `index`-th episode from a base seed.
    #[must_use]
    pub fn derive(self, index: u64) -> Self {
        let num = u128::from_be_bytes(self.0) ^ (u128::from(index) * 0x9e37_79b9_7f4a_7c15);
        Self(num.to_be_bytes())
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParsePieceSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParsePieceSeedError::InvalidLength { len: s.len() });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParsePieceSeedError::InvalidDigit);
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| ParsePieceSeedError::InvalidDigit)?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Picks every piece independently and uniformly among the seven kinds.
#[derive(Debug, Clone)]
pub struct UniformPieceSource {
    rng: Pcg32,
}

impl Default for UniformPieceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformPieceSource {
    /// Creates a source with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }
}

impl PieceSource for UniformPieceSource {
    fn next_kind(&mut self) -> PieceKind {
        self.rng.random()
    }
}

/// Deals pieces from shuffled bags holding one of each kind.
///
/// No kind can be missing for more than 12 pieces in a row.
#[derive(Debug, Clone)]
pub struct BagPieceSource {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl Default for BagPieceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BagPieceSource {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            bag: VecDeque::with_capacity(PieceKind::LEN),
        }
    }

    fn fill_bag(&mut self) {
        if self.bag.is_empty() {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }
}

impl PieceSource for BagPieceSource {
    fn next_kind(&mut self) -> PieceKind {
        self.fill_bag();
        self.bag
            .pop_front()
            .expect("Piece bag should never be empty")
    }
}

/// Repeats a fixed list of kinds forever.
#[derive(Debug, Clone)]
pub struct SequencePieceSource {
    kinds: Vec<PieceKind>,
    next: usize,
}

impl SequencePieceSource {
    /// # Panics
    ///
    /// Panics if `kinds` is empty.
    #[must_use]
    pub fn new<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = PieceKind>,
    {
        let kinds: Vec<_> = kinds.into_iter().collect();
        assert!(!kinds.is_empty(), "piece sequence must not be empty");
        Self { kinds, next: 0 }
    }
}

impl PieceSource for SequencePieceSource {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        kind
    }
}
