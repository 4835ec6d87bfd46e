use anyhow::{Result, ensure};

use crate::motion::map::PiecewiseMap;

/// Sticky-stacking portfolio cards.
///
/// Card `i` starts shrinking once section progress passes `i * 0.25` and
/// lands on a slightly smaller target scale than the card above it, so the
/// pile reads as a fanned deck. The image inside each card runs a reverse
/// parallax from 1.5x down to 1x over the card's own reveal.
#[derive(Debug)]
pub struct CardStack {
    scales: Vec<PiecewiseMap>,
    image: PiecewiseMap,
}

const STEP: f32 = 0.25;
const SCALE_GAP: f32 = 0.05;

impl CardStack {
    pub fn new(cards: usize) -> Result<Self> {
        ensure!(cards > 0, "card stack needs at least one card");
        let mut scales = Vec::with_capacity(cards);
        for i in 0..cards {
            let start = (i as f32 * STEP).min(0.999);
            let target = 1.0 - (cards - i) as f32 * SCALE_GAP;
            scales.push(PiecewiseMap::new(&[start, 1.0], &[1.0, target])?);
        }
        let image = PiecewiseMap::new(&[0.0, 1.0], &[1.5, 1.0])?;
        Ok(Self { scales, image })
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Stack scale of card `i` at overall section progress `p` (0..1).
    /// Indexes past the last card behave like the last card.
    pub fn card_scale(&self, i: usize, p: f32) -> f32 {
        self.scales[i.min(self.scales.len() - 1)].map(p)
    }

    /// Inner image scale given the card's own reveal progress (0..1).
    pub fn image_scale(&self, reveal: f32) -> f32 {
        self.image.map(reveal)
    }
}
