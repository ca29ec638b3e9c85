//! Lights and per-spatial light lists
//!
//! Every spatial owns a local light list. Its world light list is the local
//! lights followed by the parent's already-resolved world lights, optionally
//! sorted so the most influential lights come first.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Kind-specific light parameters, all in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Uniform light affecting everything equally
    Ambient,
    /// Parallel rays (sunlight)
    Directional {
        /// Direction the light travels
        direction: Vec3,
    },
    /// Radiates in all directions from a position
    Point {
        /// Light position
        position: Vec3,
        /// Radius of influence
        radius: f32,
    },
    /// Cone of light from a position
    Spot {
        /// Light position
        position: Vec3,
        /// Direction of the cone axis
        direction: Vec3,
        /// Maximum range
        range: f32,
    },
}

/// A light that can be attached to any spatial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Display name, used to remove lights by name
    pub name: String,
    /// Kind and kind-specific parameters
    pub kind: LightKind,
    /// RGB color values (0.0 to 1.0 range)
    pub color: Vec3,
    /// Whether the light currently contributes
    pub enabled: bool,
}

impl Light {
    /// Create ambient light
    pub fn ambient(name: impl Into<String>, color: Vec3) -> Self {
        Self::with_kind(name, LightKind::Ambient, color)
    }

    /// Create directional light; the direction is normalized
    pub fn directional(name: impl Into<String>, direction: Vec3, color: Vec3) -> Self {
        Self::with_kind(
            name,
            LightKind::Directional {
                direction: direction.normalize(),
            },
            color,
        )
    }

    /// Create point light
    pub fn point(name: impl Into<String>, position: Vec3, radius: f32, color: Vec3) -> Self {
        Self::with_kind(name, LightKind::Point { position, radius }, color)
    }

    /// Create spot light; the direction is normalized
    pub fn spot(
        name: impl Into<String>,
        position: Vec3,
        direction: Vec3,
        range: f32,
        color: Vec3,
    ) -> Self {
        Self::with_kind(
            name,
            LightKind::Spot {
                position,
                direction: direction.normalize(),
                range,
            },
            color,
        )
    }

    fn with_kind(name: impl Into<String>, kind: LightKind, color: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            color,
            enabled: true,
        }
    }

    /// Sort key used when ordering a world light list: lower is more
    /// influential. Ambient and directional lights reach everything and
    /// always come first; positional lights rank by the distance from
    /// `origin` to the edge of their influence.
    pub fn influence_distance(&self, origin: &Vec3) -> f32 {
        match &self.kind {
            LightKind::Ambient | LightKind::Directional { .. } => -1.0,
            LightKind::Point { position, radius } => {
                ((position - origin).norm() - radius).max(0.0)
            }
            LightKind::Spot {
                position, range, ..
            } => ((position - origin).norm() - range).max(0.0),
        }
    }
}

/// Ordered collection of lights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightList {
    lights: Vec<Light>,
}

impl LightList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a light
    pub fn add(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Remove every light with this name, returning how many were removed
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.lights.len();
        self.lights.retain(|light| light.name != name);
        before - self.lights.len()
    }

    /// Remove all lights
    pub fn clear(&mut self) {
        self.lights.clear();
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// True when the list holds no lights
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Light at `index`
    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    /// Iterate in list order
    pub fn iter(&self) -> std::slice::Iter<'_, Light> {
        self.lights.iter()
    }

    /// Rebuild this list as the world light list of a spatial: a copy of
    /// `local`, followed by `parent` (the parent's resolved world list) when
    /// the spatial is not a root.
    pub fn update(&mut self, local: &LightList, parent: Option<&LightList>) {
        self.lights.clear();
        self.lights.extend(local.lights.iter().cloned());
        if let Some(parent) = parent {
            self.lights.extend(parent.lights.iter().cloned());
        }
    }

    /// Stable sort by [`Light::influence_distance`] from `origin`
    pub fn sort_by_influence(&mut self, origin: &Vec3) {
        let mut keyed: Vec<(f32, Light)> = self
            .lights
            .drain(..)
            .map(|light| (light.influence_distance(origin), light))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.lights.extend(keyed.into_iter().map(|(_, light)| light));
    }
}

impl<'a> IntoIterator for &'a LightList {
    type Item = &'a Light;
    type IntoIter = std::slice::Iter<'a, Light>;

    fn into_iter(self) -> Self::IntoIter {
        self.lights.iter()
    }
}

impl FromIterator<Light> for LightList {
    fn from_iter<I: IntoIterator<Item = Light>>(iter: I) -> Self {
        Self {
            lights: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &LightList) -> Vec<&str> {
        list.iter().map(|light| light.name.as_str()).collect()
    }

    #[test]
    fn test_root_update_copies_local_only() {
        let local: LightList = [Light::ambient("sky", Vec3::repeat(0.2))].into_iter().collect();
        let mut world = LightList::new();
        world.add(Light::ambient("stale", Vec3::zeros()));

        world.update(&local, None);

        assert_eq!(names(&world), vec!["sky"]);
    }

    #[test]
    fn test_update_appends_parent_after_local() {
        let local: LightList = [Light::point("lamp", Vec3::zeros(), 5.0, Vec3::repeat(1.0))]
            .into_iter()
            .collect();
        let parent: LightList = [
            Light::directional("sun", Vec3::new(0.0, -1.0, 0.0), Vec3::repeat(1.0)),
            Light::ambient("fill", Vec3::repeat(0.1)),
        ]
        .into_iter()
        .collect();
        let mut world = LightList::new();

        world.update(&local, Some(&parent));

        assert_eq!(names(&world), vec!["lamp", "sun", "fill"]);
    }

    #[test]
    fn test_sort_puts_global_lights_first_and_is_stable() {
        let mut list: LightList = [
            Light::point("far", Vec3::new(100.0, 0.0, 0.0), 1.0, Vec3::repeat(1.0)),
            Light::ambient("fill", Vec3::repeat(0.1)),
            Light::point("near", Vec3::new(3.0, 0.0, 0.0), 1.0, Vec3::repeat(1.0)),
            Light::directional("sun", Vec3::new(0.0, -1.0, 0.0), Vec3::repeat(1.0)),
        ]
        .into_iter()
        .collect();

        list.sort_by_influence(&Vec3::zeros());

        assert_eq!(names(&list), vec!["fill", "sun", "near", "far"]);
    }

    #[test]
    fn test_remove_by_name() {
        let mut list: LightList = [
            Light::ambient("a", Vec3::zeros()),
            Light::ambient("b", Vec3::zeros()),
            Light::ambient("a", Vec3::zeros()),
        ]
        .into_iter()
        .collect();

        assert_eq!(list.remove_by_name("a"), 2);
        assert_eq!(names(&list), vec!["b"]);
    }
}
