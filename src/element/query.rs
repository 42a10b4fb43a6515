use kurbo::{BezPath, Shape};

use crate::element::node::{ElementId, ElementKind};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Affine, Point, Rect, Space};
use crate::transform::chain::Transform;

fn polygon_contains(border: &[Point], p: Point) -> bool {
    let Some((first, rest)) = border.split_first() else {
        return false;
    };
    if rest.len() < 2 {
        return false;
    }
    let mut path = BezPath::new();
    path.move_to(*first);
    for v in rest {
        path.line_to(*v);
    }
    path.close_path();
    path.contains(p)
}

impl ElementTree {
    /// Element transform followed by every ancestor transform.
    pub fn figure_transform(&self, id: ElementId) -> Transform {
        self.ancestors(id)
            .into_iter()
            .filter_map(|a| self.get(a))
            .fold(Transform::new(), |acc, el| acc.transform(&el.transform))
    }

    /// Maps the element's draw space into figure space.
    pub fn figure_matrix(&self, id: ElementId) -> Affine {
        self.figure_transform(id).matrix()
    }

    /// Figure limits onto `[-1, 1]`.
    pub fn figure_to_gl(&self) -> Affine {
        let l = self.limits;
        Affine::translate((-1.0, -1.0))
            * Affine::scale_non_uniform(2.0 / l.width(), 2.0 / l.height())
            * Affine::translate((-l.x0, -l.y0))
    }

    /// Gl space onto canvas pixels, y down.
    pub fn gl_to_pixel(&self) -> Affine {
        let w = self.canvas.width / 2.0;
        let h = self.canvas.height / 2.0;
        Affine::new([w, 0.0, 0.0, -h, w, h])
    }

    pub fn pixel_to_figure(&self, p: Point) -> Point {
        (self.gl_to_pixel() * self.figure_to_gl()).inverse() * p
    }

    /// Matrix from the element's draw space into `space`.
    pub fn space_matrix(&self, id: ElementId, space: Space) -> Option<Affine> {
        let el = self.get(id)?;
        Some(match space {
            Space::Draw => Affine::IDENTITY,
            Space::Local => el.transform.matrix(),
            Space::Figure => self.figure_matrix(id),
            Space::Gl => self.figure_to_gl() * self.figure_matrix(id),
            Space::Pixel => self.gl_to_pixel() * self.figure_to_gl() * self.figure_matrix(id),
        })
    }

    fn collect_points(&self, id: ElementId, m: Affine, out: &mut Vec<Point>) {
        let Some(el) = self.get(id) else {
            return;
        };
        match &el.kind {
            ElementKind::Primitive(p) => out.extend(p.border.iter().map(|v| m * *v)),
            ElementKind::Collection(c) => {
                for child in &c.draw_order {
                    if let Some(ch) = self.get(*child).filter(|ch| ch.is_shown) {
                        self.collect_points(*child, m * ch.transform.matrix(), out);
                    }
                }
            }
        }
    }

    /// Bounds of the element's border in `space`. Collections cover their shown descendants.
    ///
    /// `None` when there is nothing to bound.
    pub fn get_bounding_rect(&self, id: ElementId, space: Space) -> Option<Rect> {
        let m = self.space_matrix(id, space)?;
        let mut points = Vec::new();
        self.collect_points(id, m, &mut points);
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
        )
    }

    /// Position of the element's origin in `space`.
    pub fn get_position(&self, id: ElementId, space: Space) -> Option<Point> {
        let el = self.get(id)?;
        let local = el.transform.t().unwrap_or(Point::ZERO);
        Some(match space {
            Space::Draw => Point::ZERO,
            Space::Local => local,
            _ => {
                let parent_to_figure =
                    el.parent.map_or(Affine::IDENTITY, |p| self.figure_matrix(p));
                let figure = parent_to_figure * local;
                match space {
                    Space::Gl => self.figure_to_gl() * figure,
                    Space::Pixel => self.gl_to_pixel() * self.figure_to_gl() * figure,
                    _ => figure,
                }
            }
        })
    }

    fn is_being_touched(&self, id: ElementId, figure_point: Point) -> bool {
        let Some(el) = self.get(id) else {
            return false;
        };
        match &el.kind {
            ElementKind::Primitive(p) => {
                let draw_point = self.figure_matrix(id).inverse() * figure_point;
                polygon_contains(p.touch_polygon(), draw_point)
            }
            ElementKind::Collection(_) => self
                .get_bounding_rect(id, Space::Figure)
                .is_some_and(|r| r.contains(figure_point)),
        }
    }

    fn touched_in(&self, id: ElementId, p: Point, out: &mut Vec<ElementId>) {
        let Some(el) = self.get(id) else {
            return;
        };
        if !el.is_shown {
            return;
        }
        if el.is_touchable {
            if self.is_being_touched(id, p) {
                out.push(id);
            }
            return;
        }
        for child in el.children().iter().rev() {
            self.touched_in(*child, p, out);
        }
    }

    /// Touchable elements under a figure-space point, topmost first.
    ///
    /// A touchable collection answers for its whole subtree.
    pub fn get_touched(&self, p: Point) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.touched_in(self.root(), p, &mut out);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/query.rs"]
mod tests;
