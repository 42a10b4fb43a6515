//! Tagged `{f1Type, state}` wrappers used by the snapshot format.

use crate::foundation::core::{Point, Rect};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Tagged<T> {
    #[serde(rename = "f1Type")]
    pub(crate) f1_type: String,
    pub(crate) state: T,
}

impl<T> Tagged<T> {
    pub(crate) fn new(f1_type: &str, state: T) -> Self {
        Self {
            f1_type: f1_type.to_owned(),
            state,
        }
    }

    pub(crate) fn expect_tag(self, f1_type: &str) -> Result<T, String> {
        if self.f1_type == f1_type {
            Ok(self.state)
        } else {
            Err(format!(
                "expected f1Type '{f1_type}', found '{}'",
                self.f1_type
            ))
        }
    }
}

/// `Point` as `{f1Type: "p", state: [x, y]}`.
pub(crate) mod point {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Point, Tagged};

    pub(crate) fn serialize<S: Serializer>(p: &Point, s: S) -> Result<S::Ok, S::Error> {
        Tagged::new("p", [p.x, p.y]).serialize(s)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Point, D::Error> {
        let [x, y] = Tagged::<[f64; 2]>::deserialize(d)?
            .expect_tag("p")
            .map_err(serde::de::Error::custom)?;
        Ok(Point::new(x, y))
    }
}

/// `Option<Point>` as a tagged point or `null`.
pub(crate) mod opt_point {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Point, Tagged};

    pub(crate) fn serialize<S: Serializer>(p: &Option<Point>, s: S) -> Result<S::Ok, S::Error> {
        p.map(|p| Tagged::new("p", [p.x, p.y])).serialize(s)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Point>, D::Error> {
        match Option::<Tagged<[f64; 2]>>::deserialize(d)? {
            None => Ok(None),
            Some(t) => {
                let [x, y] = t.expect_tag("p").map_err(serde::de::Error::custom)?;
                Ok(Some(Point::new(x, y)))
            }
        }
    }
}

/// `Rect` as `{f1Type: "rect", state: [x, y, width, height]}`.
pub(crate) mod rect {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Rect, Tagged};

    pub(crate) fn serialize<S: Serializer>(r: &Rect, s: S) -> Result<S::Ok, S::Error> {
        Tagged::new("rect", [r.x0, r.y0, r.width(), r.height()]).serialize(s)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rect, D::Error> {
        let [x, y, w, h] = Tagged::<[f64; 4]>::deserialize(d)?
            .expect_tag("rect")
            .map_err(serde::de::Error::custom)?;
        Ok(Rect::new(x, y, x + w, y + h))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/tagged.rs"]
mod tests;
