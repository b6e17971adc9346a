//! A single step cell and its playback modifier.

/// Number of subdivisions a ratchet splits its step into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ratchet {
    Two,
    Four,
}

impl Ratchet {
    /// How many evenly spaced triggers the step produces.
    pub const fn divisions(self) -> u8 {
        match self {
            Ratchet::Two => 2,
            Ratchet::Four => 4,
        }
    }
}

/// Per-step playback modifier.
///
/// Ratchets subdivide the step, `Glide` slides pitched tracks into the note,
/// and the two cycle gates make the step conditional on the loop counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Modifier {
    #[default]
    None,
    Ratchet(Ratchet),
    Glide,
    /// Fires only on even loop cycles (0, 2, 4, ...).
    SkipCycle,
    /// Fires only during the first loop cycle after playback starts.
    OnlyFirstCycle,
}

impl Modifier {
    /// Every modifier, in persistence-code order.
    pub const ALL: [Modifier; 6] = [
        Modifier::None,
        Modifier::Ratchet(Ratchet::Two),
        Modifier::Ratchet(Ratchet::Four),
        Modifier::Glide,
        Modifier::SkipCycle,
        Modifier::OnlyFirstCycle,
    ];

    /// Integer code used in the persistence tree.
    pub const fn code(self) -> u8 {
        match self {
            Modifier::None => 0,
            Modifier::Ratchet(Ratchet::Two) => 1,
            Modifier::Ratchet(Ratchet::Four) => 2,
            Modifier::Glide => 3,
            Modifier::SkipCycle => 4,
            Modifier::OnlyFirstCycle => 5,
        }
    }

    /// Inverse of [`Modifier::code`]. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Modifier> {
        Self::ALL.get(code as usize).copied()
    }

    /// Ratchet subdivision count, if this modifier ratchets.
    pub fn ratchet_divisions(self) -> Option<u8> {
        match self {
            Modifier::Ratchet(r) => Some(r.divisions()),
            _ => None,
        }
    }

    /// Whether a step carrying this modifier may fire on loop cycle `cycle`.
    pub fn passes_cycle_gate(self, cycle: u32) -> bool {
        match self {
            Modifier::SkipCycle => cycle % 2 == 0,
            Modifier::OnlyFirstCycle => cycle == 0,
            Modifier::None | Modifier::Ratchet(_) | Modifier::Glide => true,
        }
    }
}

/// One cell of a track's step grid.
///
/// Velocity and probability always lie in `[0, 1]`; the setters clamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub active: bool,
    velocity: f32,
    probability: f32,
    pub modifier: Modifier,
}

impl Default for Step {
    fn default() -> Self {
        Self { active: false, velocity: 1.0, probability: 1.0, modifier: Modifier::None }
    }
}

impl Step {
    /// An active step at full velocity that always fires.
    pub const fn on() -> Self {
        Self { active: true, velocity: 1.0, probability: 1.0, modifier: Modifier::None }
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    /// Set velocity, clamped to `[0, 1]`. Non-finite values are ignored.
    pub fn set_velocity(&mut self, velocity: f32) {
        if velocity.is_finite() {
            self.velocity = velocity.clamp(0.0, 1.0);
        }
    }

    /// Set trigger probability, clamped to `[0, 1]`. Non-finite values are ignored.
    pub fn set_probability(&mut self, probability: f32) {
        if probability.is_finite() {
            self.probability = probability.clamp(0.0, 1.0);
        }
    }

    /// Builder-style velocity.
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.set_velocity(velocity);
        self
    }

    /// Builder-style probability.
    pub fn with_probability(mut self, probability: f32) -> Self {
        self.set_probability(probability);
        self
    }

    /// Builder-style modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_inactive_full_velocity() {
        let step = Step::default();
        assert!(!step.active);
        assert_eq!(step.velocity(), 1.0);
        assert_eq!(step.probability(), 1.0);
        assert_eq!(step.modifier, Modifier::None);
    }

    #[test]
    fn setters_clamp_into_unit_range() {
        let mut step = Step::on();
        step.set_velocity(1.7);
        step.set_probability(-0.2);
        assert_eq!(step.velocity(), 1.0);
        assert_eq!(step.probability(), 0.0);
    }

    #[test]
    fn setters_ignore_nan() {
        let mut step = Step::on().with_velocity(0.5);
        step.set_velocity(f32::NAN);
        assert_eq!(step.velocity(), 0.5);
    }

    #[test]
    fn modifier_codes_are_stable() {
        for (code, modifier) in Modifier::ALL.iter().enumerate() {
            assert_eq!(modifier.code() as usize, code);
            assert_eq!(Modifier::from_code(code as u8), Some(*modifier));
        }
        assert_eq!(Modifier::from_code(6), None);
    }

    #[test]
    fn cycle_gates() {
        assert!(Modifier::SkipCycle.passes_cycle_gate(0));
        assert!(!Modifier::SkipCycle.passes_cycle_gate(1));
        assert!(Modifier::SkipCycle.passes_cycle_gate(2));
        assert!(Modifier::OnlyFirstCycle.passes_cycle_gate(0));
        assert!(!Modifier::OnlyFirstCycle.passes_cycle_gate(1));
        assert!(Modifier::Glide.passes_cycle_gate(7));
        assert!(Modifier::Ratchet(Ratchet::Four).passes_cycle_gate(3));
    }

    #[test]
    fn ratchet_divisions() {
        assert_eq!(Modifier::Ratchet(Ratchet::Two).ratchet_divisions(), Some(2));
        assert_eq!(Modifier::Ratchet(Ratchet::Four).ratchet_divisions(), Some(4));
        assert_eq!(Modifier::Glide.ratchet_divisions(), None);
    }
}
