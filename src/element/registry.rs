use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::animation::steps::scenario::ScenarioTarget;
use crate::element::movement::MoveConfig;
use crate::element::node::{Element, ElementId, Primitive};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Point, Rgba, Vec2};
use crate::foundation::error::{FigureError, FigureResult};

/// Builds an element from its definition options. The name is assigned by the caller.
pub type ElementFactory = dyn Fn(&Value) -> FigureResult<Element>;

/// String-keyed element factories used by [`ElementTree::add_definitions`].
///
/// `ElementRegistry::default()` holds the built-in `collection`, `polygon` and `rectangle`.
#[derive(Clone)]
pub struct ElementRegistry {
    factories: HashMap<String, Rc<ElementFactory>>,
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("ElementRegistry").field("keys", &keys).finish()
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.insert("collection", make_collection);
        registry.insert("polygon", make_polygon);
        registry.insert("rectangle", make_rectangle);
        registry
    }
}

impl ElementRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    fn insert(&mut self, key: &str, f: impl Fn(&Value) -> FigureResult<Element> + 'static) {
        self.factories.insert(key.to_owned(), Rc::new(f));
    }

    /// Add a factory. Keys must be unique.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        f: impl Fn(&Value) -> FigureResult<Element> + 'static,
    ) -> FigureResult<()> {
        let key = key.into();
        if self.factories.contains_key(&key) {
            return Err(FigureError::validation(format!(
                "duplicate element factory key '{key}'"
            )));
        }
        self.factories.insert(key, Rc::new(f));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Rc<ElementFactory>> {
        self.factories.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }
}

/// One entry of a definition list.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ElementDefinition {
    name: Option<String>,
    /// Collection to add into, relative to the parent.
    path: Option<String>,
    #[serde(alias = "method")]
    make: Option<String>,
    options: Value,
    #[serde(alias = "addElements")]
    elements: Vec<Value>,
    /// Scenario to jump to once added.
    scenario: Option<String>,
}

/// Options every built-in accepts.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonOptions {
    pub position: Option<[f64; 2]>,
    pub rotation: Option<f64>,
    pub scale: Option<[f64; 2]>,
    pub color: Option<Rgba>,
    pub dim_color: Option<Rgba>,
    pub is_shown: bool,
    pub touchable: bool,
    pub movable: bool,
    #[serde(rename = "move")]
    pub move_config: Option<MoveConfig>,
    pub scenarios: BTreeMap<String, ScenarioTarget>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            position: None,
            rotation: None,
            scale: None,
            color: None,
            dim_color: None,
            is_shown: true,
            touchable: false,
            movable: false,
            move_config: None,
            scenarios: BTreeMap::new(),
        }
    }
}

impl CommonOptions {
    fn apply(self, mut el: Element) -> Element {
        if let Some([x, y]) = self.position {
            el.transform.update_translation(Point::new(x, y), None);
        }
        if let Some(r) = self.rotation {
            el.transform.update_rotation(r, None);
        }
        if let Some([x, y]) = self.scale {
            el.transform.update_scale(Vec2::new(x, y), None);
        }
        el.movement.previous_transform = el.transform.clone();
        if let Some(color) = self.color {
            el = el.with_color(color);
        }
        if let Some(dim) = self.dim_color {
            el.dim_color = dim;
        }
        el.is_shown = self.is_shown;
        if self.touchable {
            el = el.touchable();
        }
        if self.movable {
            el = el.movable();
        }
        if let Some(config) = self.move_config {
            el = el.with_move_config(config);
        }
        el.scenarios = self.scenarios;
        el
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolygonOptions {
    #[serde(flatten)]
    pub common: CommonOptions,
    pub sides: u32,
    pub radius: f64,
    /// Angle of the first vertex.
    pub offset_angle: f64,
}

impl Default for PolygonOptions {
    fn default() -> Self {
        Self {
            common: CommonOptions::default(),
            sides: 4,
            radius: 1.0,
            offset_angle: 0.0,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RectangleOptions {
    #[serde(flatten)]
    pub common: CommonOptions,
    pub width: f64,
    pub height: f64,
}

impl Default for RectangleOptions {
    fn default() -> Self {
        Self {
            common: CommonOptions::default(),
            width: 1.0,
            height: 1.0,
        }
    }
}

fn options<T: serde::de::DeserializeOwned + Default>(value: &Value) -> FigureResult<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| FigureError::config(format!("bad options: {e}")))
}

fn make_collection(value: &Value) -> FigureResult<Element> {
    let common: CommonOptions = options(value)?;
    Ok(common.apply(Element::collection("")))
}

fn make_polygon(value: &Value) -> FigureResult<Element> {
    let o: PolygonOptions = options(value)?;
    if o.sides < 3 {
        return Err(FigureError::config(format!(
            "polygon needs at least 3 sides, got {}",
            o.sides
        )));
    }
    let points = (0..o.sides)
        .map(|i| {
            let a = o.offset_angle + TAU * f64::from(i) / f64::from(o.sides);
            Point::new(o.radius * a.cos(), o.radius * a.sin())
        })
        .collect();
    Ok(o.common.apply(Element::primitive("", Primitive::polygon(points))))
}

fn make_rectangle(value: &Value) -> FigureResult<Element> {
    let o: RectangleOptions = options(value)?;
    let (w, h) = (o.width / 2.0, o.height / 2.0);
    let points = vec![
        Point::new(-w, -h),
        Point::new(w, -h),
        Point::new(w, h),
        Point::new(-w, h),
    ];
    Ok(o.common.apply(Element::primitive("", Primitive::polygon(points))))
}

impl ElementTree {
    /// Build and add every definition in `definitions` under `parent`, recursing into nested
    /// `elements`. Returns the ids added directly at this level.
    ///
    /// Errors name the offending index and the parent collection.
    #[tracing::instrument(skip(self, definitions, registry), fields(count = definitions.len()))]
    pub fn add_definitions(
        &mut self,
        parent: ElementId,
        definitions: &[Value],
        registry: &ElementRegistry,
    ) -> FigureResult<Vec<ElementId>> {
        let parent_path = self.display_path(parent);
        let mut added = Vec::with_capacity(definitions.len());
        for (index, value) in definitions.iter().enumerate() {
            let fail = |what: String| {
                FigureError::config(format!(
                    "element definition at index {index} in collection '{parent_path}': {what}"
                ))
            };
            let def: ElementDefinition =
                serde_json::from_value(value.clone()).map_err(|e| fail(e.to_string()))?;
            let name = def
                .name
                .filter(|n| !n.is_empty())
                .ok_or_else(|| fail("missing name".to_owned()))?;
            let make = def
                .make
                .filter(|m| !m.is_empty())
                .ok_or_else(|| fail("missing make".to_owned()))?;
            let target = match def.path.as_deref().filter(|p| !p.is_empty()) {
                None => parent,
                Some(path) => self
                    .get_element_in(parent, path)
                    .filter(|id| self.get(*id).is_some_and(Element::is_collection))
                    .ok_or_else(|| fail(format!("path '{path}' is not a collection")))?,
            };
            let factory = registry
                .get(&make)
                .ok_or_else(|| fail(format!("unknown element kind '{make}'")))?;
            let mut element = factory(&def.options).map_err(|e| fail(e.to_string()))?;
            element.name = name;
            let id = self.add(target, element).map_err(|e| fail(e.to_string()))?;
            if !def.elements.is_empty() {
                if !self.get(id).is_some_and(Element::is_collection) {
                    return Err(fail(format!("'{make}' cannot hold nested elements")));
                }
                self.add_definitions(id, &def.elements, registry)?;
            }
            if let Some(scenario) = def.scenario {
                self.set_scenario_now(id, &scenario);
            }
            tracing::debug!(path = %self.get_path(id), kind = %make, "element added");
            added.push(id);
        }
        Ok(added)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/registry.rs"]
mod tests;
