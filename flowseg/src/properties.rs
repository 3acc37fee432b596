//! Dynamic properties.
//!
//! Pipeline stages expose their tunables as named, bounded properties. Front-ends can list them,
//! and override them by name without knowing the concrete stage type.

use crate::prelude::v1::*;
use std::ops::{Deref, DerefMut};

/// Object with custom properties.
pub trait Properties {
    /// Get available properties.
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![]
    }

    fn props(&mut self) -> Vec<(&str, Property)> {
        self.props_mut()
            .into_iter()
            .map(|(n, p)| (n, p.into()))
            .collect()
    }

    /// Parse and set a property by its name.
    ///
    /// # Arguments
    ///
    /// * `name` - name of the property, as returned by `props_mut`.
    /// * `value` - textual value to parse.
    fn set_prop(&mut self, name: &str, value: &str) -> Result<()> {
        let (_, mut prop) = self
            .props_mut()
            .into_iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| anyhow!("unknown property \"{name}\""))?;
        prop.parse_set(value)
    }
}

impl<T: Properties + ?Sized> Properties for Box<T> {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        (**self).props_mut()
    }
}

/// Property with a lower and upper bound.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundedProp<T> {
    pub val: T,
    pub min: T,
    pub max: T,
}

impl<T> Deref for BoundedProp<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.val
    }
}

impl<'a, T: Copy> From<BoundedPropMut<'a, T>> for BoundedProp<T> {
    fn from(BoundedPropMut { val, min, max }: BoundedPropMut<'a, T>) -> Self {
        Self {
            val: *val,
            min,
            max,
        }
    }
}

/// Describes the type of a property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Property {
    Bool(bool),
    Float(BoundedProp<f32>),
    Usize(BoundedProp<usize>),
}

impl<'a> From<PropertyMut<'a>> for Property {
    fn from(prop: PropertyMut<'a>) -> Self {
        match prop {
            PropertyMut::Bool(b) => Self::Bool(*b),
            PropertyMut::Float(p) => Self::Float(p.into()),
            PropertyMut::Usize(p) => Self::Usize(p.into()),
        }
    }
}

/// Mutable handle to a bounded property.
pub struct BoundedPropMut<'a, T> {
    pub val: &'a mut T,
    pub min: T,
    pub max: T,
}

impl<'a, T> Deref for BoundedPropMut<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.val
    }
}

impl<'a, T> DerefMut for BoundedPropMut<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.val
    }
}

impl<'a, T: PartialOrd + Copy> BoundedPropMut<'a, T> {
    /// Set the value, clamped between the lower and upper bounds.
    pub fn set_clamped(&mut self, val: T) {
        *self.val = if val < self.min {
            self.min
        } else if val > self.max {
            self.max
        } else {
            val
        };
    }
}

/// Mutable handle to a property.
pub enum PropertyMut<'a> {
    Bool(&'a mut bool),
    Float(BoundedPropMut<'a, f32>),
    Usize(BoundedPropMut<'a, usize>),
}

impl<'a> PropertyMut<'a> {
    /// Create a boolean property.
    ///
    /// # Arguments
    ///
    /// * `b` - reference to the underlying boolean to be mutated.
    pub fn bool(b: &'a mut bool) -> Self {
        Self::Bool(b)
    }

    /// Create a floating point property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying float to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn float(val: &'a mut f32, min: f32, max: f32) -> Self {
        Self::Float(BoundedPropMut { val, min, max })
    }

    /// Create an integer property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying usize to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn usize(val: &'a mut usize, min: usize, max: usize) -> Self {
        Self::Usize(BoundedPropMut { val, min, max })
    }

    /// Parse a textual value and set it, clamped to the property bounds.
    pub fn parse_set(&mut self, value: &str) -> Result<()> {
        let value = value.trim();
        match self {
            Self::Bool(b) => **b = value.parse()?,
            Self::Float(val) => val.set_clamped(value.parse()?),
            Self::Usize(val) => val.set_clamped(value.parse()?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knobs {
        gain: f32,
        count: usize,
        enabled: bool,
    }

    impl Properties for Knobs {
        fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
            vec![
                ("Gain", PropertyMut::float(&mut self.gain, 0.0, 10.0)),
                ("Count", PropertyMut::usize(&mut self.count, 1, 5)),
                ("Enabled", PropertyMut::bool(&mut self.enabled)),
            ]
        }
    }

    #[test]
    fn set_by_name_clamps() {
        let mut knobs = Knobs {
            gain: 1.0,
            count: 2,
            enabled: false,
        };

        knobs.set_prop("Gain", "12.5").unwrap();
        knobs.set_prop("Count", " 3 ").unwrap();
        knobs.set_prop("Enabled", "true").unwrap();

        assert_eq!(knobs.gain, 10.0);
        assert_eq!(knobs.count, 3);
        assert!(knobs.enabled);

        knobs.set_prop("Count", "0").unwrap();
        assert_eq!(knobs.count, 1);
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        let mut knobs = Knobs {
            gain: 1.0,
            count: 2,
            enabled: false,
        };

        assert!(knobs.set_prop("Missing", "1").is_err());
        assert!(knobs.set_prop("Count", "-1").is_err());
        assert!(knobs.set_prop("Gain", "fast").is_err());
        assert_eq!(knobs.count, 2);
        assert_eq!(knobs.gain, 1.0);
    }

    #[test]
    fn snapshot_values() {
        let mut knobs = Knobs {
            gain: 4.0,
            count: 2,
            enabled: true,
        };

        let snapshot = knobs
            .props()
            .into_iter()
            .map(|(_, p)| p)
            .collect::<Vec<_>>();
        assert_eq!(
            snapshot[0],
            Property::Float(BoundedProp {
                val: 4.0,
                min: 0.0,
                max: 10.0
            })
        );

        assert_eq!(snapshot[1], Property::Usize(BoundedProp { val: 2, min: 1, max: 5 }));
        assert_eq!(snapshot[2], Property::Bool(true));
    }
}
