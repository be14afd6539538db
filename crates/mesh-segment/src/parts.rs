//! Body part taxonomy and total part containers.
//!
//! The R6 and R15 rigs are fixed taxonomies: every segmentation run produces
//! exactly the parts listed in [`R6_PARTS`] or [`R15_PARTS`], in that order.
//! The containers here have one named field per slot, so "a part went
//! missing" is not representable.

/// A named body part in either the R6 or R15 taxonomy.
///
/// `Head` belongs to both rigs; the torso and limb parts are rig-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyPart {
    // Shared
    Head,

    // R6
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,

    // R15
    UpperTorso,
    LowerTorso,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
}

/// The six R6 parts in canonical order.
pub const R6_PARTS: [BodyPart; 6] = [
    BodyPart::Head,
    BodyPart::Torso,
    BodyPart::LeftArm,
    BodyPart::RightArm,
    BodyPart::LeftLeg,
    BodyPart::RightLeg,
];

/// The fifteen R15 parts in canonical order.
pub const R15_PARTS: [BodyPart; 15] = [
    BodyPart::Head,
    BodyPart::UpperTorso,
    BodyPart::LowerTorso,
    BodyPart::LeftUpperArm,
    BodyPart::LeftLowerArm,
    BodyPart::LeftHand,
    BodyPart::RightUpperArm,
    BodyPart::RightLowerArm,
    BodyPart::RightHand,
    BodyPart::LeftUpperLeg,
    BodyPart::LeftLowerLeg,
    BodyPart::LeftFoot,
    BodyPart::RightUpperLeg,
    BodyPart::RightLowerLeg,
    BodyPart::RightFoot,
];

impl BodyPart {
    /// The part's canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            BodyPart::Head => "Head",
            BodyPart::Torso => "Torso",
            BodyPart::LeftArm => "LeftArm",
            BodyPart::RightArm => "RightArm",
            BodyPart::LeftLeg => "LeftLeg",
            BodyPart::RightLeg => "RightLeg",
            BodyPart::UpperTorso => "UpperTorso",
            BodyPart::LowerTorso => "LowerTorso",
            BodyPart::LeftUpperArm => "LeftUpperArm",
            BodyPart::LeftLowerArm => "LeftLowerArm",
            BodyPart::LeftHand => "LeftHand",
            BodyPart::RightUpperArm => "RightUpperArm",
            BodyPart::RightLowerArm => "RightLowerArm",
            BodyPart::RightHand => "RightHand",
            BodyPart::LeftUpperLeg => "LeftUpperLeg",
            BodyPart::LeftLowerLeg => "LeftLowerLeg",
            BodyPart::LeftFoot => "LeftFoot",
            BodyPart::RightUpperLeg => "RightUpperLeg",
            BodyPart::RightLowerLeg => "RightLowerLeg",
            BodyPart::RightFoot => "RightFoot",
        }
    }

    /// True for parts on the character's left side.
    pub fn is_left(&self) -> bool {
        matches!(
            self,
            BodyPart::LeftArm
                | BodyPart::LeftLeg
                | BodyPart::LeftUpperArm
                | BodyPart::LeftLowerArm
                | BodyPart::LeftHand
                | BodyPart::LeftUpperLeg
                | BodyPart::LeftLowerLeg
                | BodyPart::LeftFoot
        )
    }

    /// True for parts on the character's right side.
    pub fn is_right(&self) -> bool {
        matches!(
            self,
            BodyPart::RightArm
                | BodyPart::RightLeg
                | BodyPart::RightUpperArm
                | BodyPart::RightLowerArm
                | BodyPart::RightHand
                | BodyPart::RightUpperLeg
                | BodyPart::RightLowerLeg
                | BodyPart::RightFoot
        )
    }

    /// The R6 region an R15 part subdivides, or `None` for R6 parts.
    pub fn r6_parent(&self) -> Option<BodyPart> {
        match self {
            BodyPart::UpperTorso | BodyPart::LowerTorso => Some(BodyPart::Torso),
            BodyPart::LeftUpperArm | BodyPart::LeftLowerArm | BodyPart::LeftHand => {
                Some(BodyPart::LeftArm)
            }
            BodyPart::RightUpperArm | BodyPart::RightLowerArm | BodyPart::RightHand => {
                Some(BodyPart::RightArm)
            }
            BodyPart::LeftUpperLeg | BodyPart::LeftLowerLeg | BodyPart::LeftFoot => {
                Some(BodyPart::LeftLeg)
            }
            BodyPart::RightUpperLeg | BodyPart::RightLowerLeg | BodyPart::RightFoot => {
                Some(BodyPart::RightLeg)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per R6 part.
#[derive(Debug, Clone, Default)]
pub struct R6Parts<T> {
    pub head: T,
    pub torso: T,
    pub left_arm: T,
    pub right_arm: T,
    pub left_leg: T,
    pub right_leg: T,
}

impl<T> R6Parts<T> {
    /// Access the slot for an R6 part. Returns `None` for R15-only parts.
    pub fn get(&self, part: BodyPart) -> Option<&T> {
        match part {
            BodyPart::Head => Some(&self.head),
            BodyPart::Torso => Some(&self.torso),
            BodyPart::LeftArm => Some(&self.left_arm),
            BodyPart::RightArm => Some(&self.right_arm),
            BodyPart::LeftLeg => Some(&self.left_leg),
            BodyPart::RightLeg => Some(&self.right_leg),
            _ => None,
        }
    }

    /// Mutable access to the slot for an R6 part.
    pub fn get_mut(&mut self, part: BodyPart) -> Option<&mut T> {
        match part {
            BodyPart::Head => Some(&mut self.head),
            BodyPart::Torso => Some(&mut self.torso),
            BodyPart::LeftArm => Some(&mut self.left_arm),
            BodyPart::RightArm => Some(&mut self.right_arm),
            BodyPart::LeftLeg => Some(&mut self.left_leg),
            BodyPart::RightLeg => Some(&mut self.right_leg),
            _ => None,
        }
    }

    /// Iterate over all six slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, &T)> {
        [
            (BodyPart::Head, &self.head),
            (BodyPart::Torso, &self.torso),
            (BodyPart::LeftArm, &self.left_arm),
            (BodyPart::RightArm, &self.right_arm),
            (BodyPart::LeftLeg, &self.left_leg),
            (BodyPart::RightLeg, &self.right_leg),
        ]
        .into_iter()
    }

    /// Build a container by evaluating `f` once per part.
    pub fn from_fn(mut f: impl FnMut(BodyPart) -> T) -> Self {
        Self {
            head: f(BodyPart::Head),
            torso: f(BodyPart::Torso),
            left_arm: f(BodyPart::LeftArm),
            right_arm: f(BodyPart::RightArm),
            left_leg: f(BodyPart::LeftLeg),
            right_leg: f(BodyPart::RightLeg),
        }
    }

    /// Transform every slot, preserving the part association.
    pub fn map<U>(self, mut f: impl FnMut(BodyPart, T) -> U) -> R6Parts<U> {
        R6Parts {
            head: f(BodyPart::Head, self.head),
            torso: f(BodyPart::Torso, self.torso),
            left_arm: f(BodyPart::LeftArm, self.left_arm),
            right_arm: f(BodyPart::RightArm, self.right_arm),
            left_leg: f(BodyPart::LeftLeg, self.left_leg),
            right_leg: f(BodyPart::RightLeg, self.right_leg),
        }
    }
}

/// One value per R15 part.
#[derive(Debug, Clone, Default)]
pub struct R15Parts<T> {
    pub head: T,
    pub upper_torso: T,
    pub lower_torso: T,
    pub left_upper_arm: T,
    pub left_lower_arm: T,
    pub left_hand: T,
    pub right_upper_arm: T,
    pub right_lower_arm: T,
    pub right_hand: T,
    pub left_upper_leg: T,
    pub left_lower_leg: T,
    pub left_foot: T,
    pub right_upper_leg: T,
    pub right_lower_leg: T,
    pub right_foot: T,
}

impl<T> R15Parts<T> {
    /// Access the slot for an R15 part. Returns `None` for R6-only parts.
    pub fn get(&self, part: BodyPart) -> Option<&T> {
        match part {
            BodyPart::Head => Some(&self.head),
            BodyPart::UpperTorso => Some(&self.upper_torso),
            BodyPart::LowerTorso => Some(&self.lower_torso),
            BodyPart::LeftUpperArm => Some(&self.left_upper_arm),
            BodyPart::LeftLowerArm => Some(&self.left_lower_arm),
            BodyPart::LeftHand => Some(&self.left_hand),
            BodyPart::RightUpperArm => Some(&self.right_upper_arm),
            BodyPart::RightLowerArm => Some(&self.right_lower_arm),
            BodyPart::RightHand => Some(&self.right_hand),
            BodyPart::LeftUpperLeg => Some(&self.left_upper_leg),
            BodyPart::LeftLowerLeg => Some(&self.left_lower_leg),
            BodyPart::LeftFoot => Some(&self.left_foot),
            BodyPart::RightUpperLeg => Some(&self.right_upper_leg),
            BodyPart::RightLowerLeg => Some(&self.right_lower_leg),
            BodyPart::RightFoot => Some(&self.right_foot),
            _ => None,
        }
    }

    /// Mutable access to the slot for an R15 part.
    pub fn get_mut(&mut self, part: BodyPart) -> Option<&mut T> {
        match part {
            BodyPart::Head => Some(&mut self.head),
            BodyPart::UpperTorso => Some(&mut self.upper_torso),
            BodyPart::LowerTorso => Some(&mut self.lower_torso),
            BodyPart::LeftUpperArm => Some(&mut self.left_upper_arm),
            BodyPart::LeftLowerArm => Some(&mut self.left_lower_arm),
            BodyPart::LeftHand => Some(&mut self.left_hand),
            BodyPart::RightUpperArm => Some(&mut self.right_upper_arm),
            BodyPart::RightLowerArm => Some(&mut self.right_lower_arm),
            BodyPart::RightHand => Some(&mut self.right_hand),
            BodyPart::LeftUpperLeg => Some(&mut self.left_upper_leg),
            BodyPart::LeftLowerLeg => Some(&mut self.left_lower_leg),
            BodyPart::LeftFoot => Some(&mut self.left_foot),
            BodyPart::RightUpperLeg => Some(&mut self.right_upper_leg),
            BodyPart::RightLowerLeg => Some(&mut self.right_lower_leg),
            BodyPart::RightFoot => Some(&mut self.right_foot),
            _ => None,
        }
    }

    /// Iterate over all fifteen slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, &T)> {
        [
            (BodyPart::Head, &self.head),
            (BodyPart::UpperTorso, &self.upper_torso),
            (BodyPart::LowerTorso, &self.lower_torso),
            (BodyPart::LeftUpperArm, &self.left_upper_arm),
            (BodyPart::LeftLowerArm, &self.left_lower_arm),
            (BodyPart::LeftHand, &self.left_hand),
            (BodyPart::RightUpperArm, &self.right_upper_arm),
            (BodyPart::RightLowerArm, &self.right_lower_arm),
            (BodyPart::RightHand, &self.right_hand),
            (BodyPart::LeftUpperLeg, &self.left_upper_leg),
            (BodyPart::LeftLowerLeg, &self.left_lower_leg),
            (BodyPart::LeftFoot, &self.left_foot),
            (BodyPart::RightUpperLeg, &self.right_upper_leg),
            (BodyPart::RightLowerLeg, &self.right_lower_leg),
            (BodyPart::RightFoot, &self.right_foot),
        ]
        .into_iter()
    }

    /// Build a container by evaluating `f` once per part.
    pub fn from_fn(mut f: impl FnMut(BodyPart) -> T) -> Self {
        Self {
            head: f(BodyPart::Head),
            upper_torso: f(BodyPart::UpperTorso),
            lower_torso: f(BodyPart::LowerTorso),
            left_upper_arm: f(BodyPart::LeftUpperArm),
            left_lower_arm: f(BodyPart::LeftLowerArm),
            left_hand: f(BodyPart::LeftHand),
            right_upper_arm: f(BodyPart::RightUpperArm),
            right_lower_arm: f(BodyPart::RightLowerArm),
            right_hand: f(BodyPart::RightHand),
            left_upper_leg: f(BodyPart::LeftUpperLeg),
            left_lower_leg: f(BodyPart::LeftLowerLeg),
            left_foot: f(BodyPart::LeftFoot),
            right_upper_leg: f(BodyPart::RightUpperLeg),
            right_lower_leg: f(BodyPart::RightLowerLeg),
            right_foot: f(BodyPart::RightFoot),
        }
    }

    /// Transform every slot, preserving the part association.
    pub fn map<U>(self, mut f: impl FnMut(BodyPart, T) -> U) -> R15Parts<U> {
        R15Parts {
            head: f(BodyPart::Head, self.head),
            upper_torso: f(BodyPart::UpperTorso, self.upper_torso),
            lower_torso: f(BodyPart::LowerTorso, self.lower_torso),
            left_upper_arm: f(BodyPart::LeftUpperArm, self.left_upper_arm),
            left_lower_arm: f(BodyPart::LeftLowerArm, self.left_lower_arm),
            left_hand: f(BodyPart::LeftHand, self.left_hand),
            right_upper_arm: f(BodyPart::RightUpperArm, self.right_upper_arm),
            right_lower_arm: f(BodyPart::RightLowerArm, self.right_lower_arm),
            right_hand: f(BodyPart::RightHand, self.right_hand),
            left_upper_leg: f(BodyPart::LeftUpperLeg, self.left_upper_leg),
            left_lower_leg: f(BodyPart::LeftLowerLeg, self.left_lower_leg),
            left_foot: f(BodyPart::LeftFoot, self.left_foot),
            right_upper_leg: f(BodyPart::RightUpperLeg, self.right_upper_leg),
            right_lower_leg: f(BodyPart::RightLowerLeg, self.right_lower_leg),
            right_foot: f(BodyPart::RightFoot, self.right_foot),
        }
    }
}
