use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::animation::manager::AnimationManager;
use crate::animation::steps::scenario::ScenarioTarget;
use crate::element::movement::{MoveConfig, Movement};
use crate::element::pulse::PulseState;
use crate::foundation::core::{Point, Rgba};
use crate::foundation::tagged::Tagged;
use crate::notify::Notifications;
use crate::transform::chain::Transform;

/// Handle of an element in an [`ElementTree`](crate::ElementTree) arena.
///
/// Serialized as a tagged `{f1Type: "de", state: index}` reference.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "Tagged<usize>", into = "Tagged<usize>")]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<ElementId> for Tagged<usize> {
    fn from(id: ElementId) -> Self {
        Tagged::new("de", id.0)
    }
}

impl TryFrom<Tagged<usize>> for ElementId {
    type Error = String;

    fn try_from(t: Tagged<usize>) -> Result<Self, Self::Error> {
        t.expect_tag("de").map(ElementId)
    }
}

/// Activity an element must finish before it reports `stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StopSource {
    Animations,
    Pulse,
    MovingFreely,
}

/// Leaf drawable: vertices for the renderer plus a border for bounds and touch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Primitive {
    /// Vertices in draw space, handed to the renderer unchanged.
    pub points: Vec<Point>,
    pub border: Vec<Point>,
    /// Falls back to `border` when empty.
    pub touch_border: Vec<Point>,
}

impl Primitive {
    /// Closed polygon whose vertices double as its border.
    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            border: points.clone(),
            points,
            touch_border: Vec::new(),
        }
    }

    pub(crate) fn touch_polygon(&self) -> &[Point] {
        if self.touch_border.is_empty() {
            &self.border
        } else {
            &self.touch_border
        }
    }
}

/// Named children in draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    pub(crate) names: HashMap<String, ElementId>,
    pub(crate) draw_order: Vec<ElementId>,
}

impl Collection {
    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    pub fn draw_order(&self) -> &[ElementId] {
        &self.draw_order
    }

    pub fn len(&self) -> usize {
        self.draw_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw_order.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Primitive(Primitive),
    Collection(Collection),
}

/// One node of the figure: a transform, visual state and the machinery that animates it.
#[derive(Debug)]
pub struct Element {
    pub name: String,
    pub(crate) parent: Option<ElementId>,
    pub transform: Transform,
    pub color: Rgba,
    pub default_color: Rgba,
    pub dim_color: Rgba,
    pub opacity: f64,
    pub is_shown: bool,
    pub is_touchable: bool,
    pub is_movable: bool,
    pub move_config: MoveConfig,
    pub scenarios: BTreeMap<String, ScenarioTarget>,
    pub animations: AnimationManager,
    pub movement: Movement,
    pub pulse: PulseState,
    /// Stamped copies; each entry draws the element once more.
    pub copy_transforms: Vec<Transform>,
    pub notifications: Notifications,
    pub(crate) pending_stops: BTreeSet<StopSource>,
    pub kind: ElementKind,
}

pub(crate) fn default_transform() -> Transform {
    Transform::new().scale(1.0, 1.0).rotate(0.0).translate(0.0, 0.0)
}

impl Element {
    fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        let transform = default_transform();
        Self {
            name: name.into(),
            parent: None,
            movement: Movement::at_rest(&transform),
            transform,
            color: Rgba::WHITE,
            default_color: Rgba::WHITE,
            dim_color: Rgba::DIM,
            opacity: 1.0,
            is_shown: true,
            is_touchable: false,
            is_movable: false,
            move_config: MoveConfig::default(),
            scenarios: BTreeMap::new(),
            animations: AnimationManager::default(),
            pulse: PulseState::default(),
            copy_transforms: Vec::new(),
            notifications: Notifications::default(),
            pending_stops: BTreeSet::new(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self::new(name, ElementKind::Primitive(primitive))
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Collection(Collection::default()))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.movement = Movement::at_rest(&transform);
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.transform.update_translation(Point::new(x, y), None);
        self
    }

    /// Sets both the current and the default color.
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self.default_color = color;
        self
    }

    pub fn with_move_config(mut self, config: MoveConfig) -> Self {
        self.move_config = config;
        self
    }

    pub fn touchable(mut self) -> Self {
        self.is_touchable = true;
        self
    }

    /// Touchable and draggable.
    pub fn movable(mut self) -> Self {
        self.is_touchable = true;
        self.is_movable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_shown = false;
        self
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match &self.kind {
            ElementKind::Collection(c) => Some(c),
            ElementKind::Primitive(_) => None,
        }
    }

    pub(crate) fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match &mut self.kind {
            ElementKind::Collection(c) => Some(c),
            ElementKind::Primitive(_) => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            ElementKind::Primitive(p) => Some(p),
            ElementKind::Collection(_) => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ElementKind::Collection(_))
    }

    /// Children in draw order. Empty for primitives.
    pub fn children(&self) -> &[ElementId] {
        self.as_collection().map_or(&[], |c| c.draw_order.as_slice())
    }

    pub fn position(&self) -> Option<Point> {
        self.transform.t()
    }

    /// Own activity only; collections also ask their children through the tree.
    pub fn is_active(&self) -> bool {
        self.animations.is_animating() || self.movement.is_moving_freely || self.pulse.is_pulsing
    }
}
