//! `STBox` (spec §4.4): a spatiotemporal bounding box over X/Y[/Z] × time,
//! carrying an SRID and a geodetic flag.
//!
//! Grounded on `mobilitydb/src/point/stbox.c`'s WKT forms (`STBOX X(...)`,
//! `STBOX ZT(...)`, `GEODSTBOX T(...)`, the `SRID=n;` prefix) and its
//! dimensionality/SRID/geodetic compatibility checks before every binary op.
//! Time-dimension shift/scale delegates to `span::span_shift_scale`, shared
//! with `TBox`.

use crate::error::{Result, TemporalError};
use crate::span::{span_shift_scale, Span};
use crate::value::{fp_eq, BaseValue, GeomBbox, GeometryValue};

/// An axis-aligned box in 2D/3D space, optionally combined with a time span.
#[derive(Debug, Clone, PartialEq)]
pub struct STBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: Option<f64>,
    pub zmax: Option<f64>,
    pub time_span: Option<Span>,
    pub srid: i32,
    pub geodetic: bool,
}

impl STBox {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        zmin: Option<f64>,
        zmax: Option<f64>,
        time_span: Option<Span>,
        srid: i32,
        geodetic: bool,
    ) -> Result<STBox> {
        if xmin > xmax || ymin > ymax {
            return Err(TemporalError::InvalidBounds("STBox space bounds must satisfy min <= max".into()));
        }
        match (zmin, zmax) {
            (Some(a), Some(b)) if a > b => {
                return Err(TemporalError::InvalidBounds("STBox z bounds must satisfy zmin <= zmax".into()))
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(TemporalError::MixedDimensionality)
            }
            _ => {}
        }
        Ok(STBox { xmin, xmax, ymin, ymax, zmin, zmax, time_span, srid, geodetic })
    }

    pub fn has_z(&self) -> bool {
        self.zmin.is_some()
    }

    /// `stbox_from_geometry`-style constructor (SPEC_FULL §4.4): derives an
    /// `STBox` from a geometry's own `GeomBbox`, as handed back by the host
    /// geometry library at construction time. The coordinates themselves are
    /// never examined, only their precomputed extent.
    pub fn from_geometry(g: &GeometryValue) -> Result<STBox> {
        let b = &g.bbox;
        STBox::new(b.xmin, b.xmax, b.ymin, b.ymax, b.zmin, b.zmax, None, g.srid, g.geodetic)
    }

    /// The inverse stub (SPEC_FULL §4.4): wraps this box's own extent back
    /// into a `GeometryValue`, carrying `wkb` through unexamined since this
    /// engine delegates geometry coordinate computation to the host.
    pub fn to_geometry(&self, wkb: Vec<u8>) -> Result<GeometryValue> {
        if self.time_span.is_some() {
            return Err(TemporalError::Unsupported("geometry conversion does not carry a time dimension".into()));
        }
        Ok(GeometryValue {
            srid: self.srid,
            geodetic: self.geodetic,
            wkb,
            bbox: GeomBbox {
                xmin: self.xmin,
                ymin: self.ymin,
                xmax: self.xmax,
                ymax: self.ymax,
                zmin: self.zmin,
                zmax: self.zmax,
            },
        })
    }

    fn check_compatible(&self, other: &STBox) -> Result<()> {
        if self.geodetic != other.geodetic {
            return Err(TemporalError::MixedGeodetic);
        }
        if self.srid != other.srid {
            return Err(TemporalError::MixedSRID(self.srid, other.srid));
        }
        if self.has_z() != other.has_z() || self.time_span.is_some() != other.time_span.is_some() {
            return Err(TemporalError::MixedDimensionality);
        }
        Ok(())
    }

    pub fn expand(&self, delta: f64) -> Result<STBox> {
        STBox::new(
            self.xmin - delta,
            self.xmax + delta,
            self.ymin - delta,
            self.ymax + delta,
            self.zmin.map(|z| z - delta),
            self.zmax.map(|z| z + delta),
            self.time_span.clone(),
            self.srid,
            self.geodetic,
        )
    }

    pub fn shift_time(&self, delta_micros: i64) -> Result<STBox> {
        let time_span = match &self.time_span {
            Some(s) => Some(span_shift_scale(s, Some(delta_micros as f64), None)?),
            None => None,
        };
        Ok(STBox { time_span, ..self.clone() })
    }

    pub fn scale_time(&self, scale: f64) -> Result<STBox> {
        let time_span = match &self.time_span {
            Some(s) => Some(span_shift_scale(s, None, Some(scale))?),
            None => None,
        };
        Ok(STBox { time_span, ..self.clone() })
    }

    pub fn shift_scale_time(&self, delta_micros: Option<i64>, scale: Option<f64>) -> Result<STBox> {
        let time_span = match &self.time_span {
            Some(s) => Some(span_shift_scale(s, delta_micros.map(|d| d as f64), scale)?),
            None => None,
        };
        Ok(STBox { time_span, ..self.clone() })
    }

    pub fn set_srid(&self, srid: i32) -> STBox {
        STBox { srid, ..self.clone() }
    }

    /// The spatial extent alone, dropping the time dimension (spec §4.4).
    pub fn get_space(&self) -> STBox {
        STBox { time_span: None, ..self.clone() }
    }

    pub fn overlaps(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        let space = self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
            && match (self.zmin, self.zmax, other.zmin, other.zmax) {
                (Some(a0), Some(a1), Some(b0), Some(b1)) => a0 <= b1 && b0 <= a1,
                _ => true,
            };
        let time = overlaps_time(&self.time_span, &other.time_span)?;
        Ok(space && time)
    }

    pub fn contains(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        let space = self.xmin <= other.xmin
            && other.xmax <= self.xmax
            && self.ymin <= other.ymin
            && other.ymax <= self.ymax
            && match (self.zmin, self.zmax, other.zmin, other.zmax) {
                (Some(a0), Some(a1), Some(b0), Some(b1)) => a0 <= b0 && b1 <= a1,
                _ => true,
            };
        let time = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.contains(b)?,
            (None, None) => true,
            _ => false,
        };
        Ok(space && time)
    }

    pub fn equal(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        let time = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.equal(b)?,
            (None, None) => true,
            _ => false,
        };
        let z = match (self.zmin, self.zmax, other.zmin, other.zmax) {
            (Some(a0), Some(a1), Some(b0), Some(b1)) => fp_eq(a0, b0) && fp_eq(a1, b1),
            (None, None, None, None) => true,
            _ => false,
        };
        Ok(fp_eq(self.xmin, other.xmin)
            && fp_eq(self.xmax, other.xmax)
            && fp_eq(self.ymin, other.ymin)
            && fp_eq(self.ymax, other.ymax)
            && z
            && time)
    }

    /// Positional predicate along X: every point of `self` strictly left of
    /// every point of `other` (spec §4.4).
    pub fn left(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(self.xmax < other.xmin)
    }

    pub fn right(&self, other: &STBox) -> Result<bool> {
        other.left(self)
    }

    pub fn below(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(self.ymax < other.ymin)
    }

    pub fn above(&self, other: &STBox) -> Result<bool> {
        other.below(self)
    }

    pub fn before(&self, other: &STBox) -> Result<bool> {
        self.check_compatible(other)?;
        match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.left(b),
            _ => Err(TemporalError::MixedDimensionality),
        }
    }

    pub fn after(&self, other: &STBox) -> Result<bool> {
        other.before(self)
    }

    pub fn union(&self, other: &STBox) -> Result<STBox> {
        self.check_compatible(other)?;
        let time_span = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => Some(a.union(b)?.unwrap_or_else(|| {
                Span::make(
                    if a.lower.compare(&b.lower).unwrap() == std::cmp::Ordering::Less { a.lower.clone() } else { b.lower.clone() },
                    if a.upper.compare(&b.upper).unwrap() == std::cmp::Ordering::Greater { a.upper.clone() } else { b.upper.clone() },
                    a.lower_inc || b.lower_inc,
                    a.upper_inc || b.upper_inc,
                )
                .expect("span endpoints already validated")
            })),
            _ => None,
        };
        STBox::new(
            self.xmin.min(other.xmin),
            self.xmax.max(other.xmax),
            self.ymin.min(other.ymin),
            self.ymax.max(other.ymax),
            zip_opt(self.zmin, other.zmin, f64::min),
            zip_opt(self.zmax, other.zmax, f64::max),
            time_span,
            self.srid,
            self.geodetic,
        )
    }

    pub fn intersection(&self, other: &STBox) -> Result<Option<STBox>> {
        self.check_compatible(other)?;
        if !self.overlaps(other)? {
            return Ok(None);
        }
        let time_span = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.intersection(b)?,
            _ => None,
        };
        Ok(Some(STBox::new(
            self.xmin.max(other.xmin),
            self.xmax.min(other.xmax),
            self.ymin.max(other.ymin),
            self.ymax.min(other.ymax),
            zip_opt(self.zmin, other.zmin, f64::max),
            zip_opt(self.zmax, other.zmax, f64::min),
            time_span,
            self.srid,
            self.geodetic,
        )?))
    }

    /// Splits the box into its four quadrants (2D) or eight octants (3D),
    /// used by the tiling engine (spec §4.7, `temporal_tile.c`'s
    /// `STBox`-grid enumeration).
    pub fn quad_split(&self) -> Vec<STBox> {
        let xmid = (self.xmin + self.xmax) / 2.0;
        let ymid = (self.ymin + self.ymax) / 2.0;
        let x_halves = [(self.xmin, xmid), (xmid, self.xmax)];
        let y_halves = [(self.ymin, ymid), (ymid, self.ymax)];
        let z_halves: Vec<(Option<f64>, Option<f64>)> = match (self.zmin, self.zmax) {
            (Some(lo), Some(hi)) => {
                let mid = (lo + hi) / 2.0;
                vec![(Some(lo), Some(mid)), (Some(mid), Some(hi))]
            }
            _ => vec![(None, None)],
        };
        let mut out = Vec::with_capacity(8);
        for (x0, x1) in x_halves {
            for (y0, y1) in y_halves {
                for &(z0, z1) in &z_halves {
                    out.push(STBox {
                        xmin: x0,
                        xmax: x1,
                        ymin: y0,
                        ymax: y1,
                        zmin: z0,
                        zmax: z1,
                        time_span: self.time_span.clone(),
                        srid: self.srid,
                        geodetic: self.geodetic,
                    });
                }
            }
        }
        out
    }

    pub fn to_text(&self) -> String {
        let kind = if self.geodetic { "GEODSTBOX" } else { "STBOX" };
        let srid_prefix = if self.srid != 0 { format!("SRID={};", self.srid) } else { String::new() };
        let dims = if self.has_z() { "Z" } else { "" };
        let has_t = self.time_span.is_some();
        let tdim = if has_t { "T" } else { "" };
        let space = if self.has_z() {
            format!(
                "({}, {}, {}, {}, {}, {})",
                self.xmin, self.ymin, self.zmin.unwrap(), self.xmax, self.ymax, self.zmax.unwrap()
            )
        } else {
            format!("({}, {}, {}, {})", self.xmin, self.ymin, self.xmax, self.ymax)
        };
        match &self.time_span {
            Some(t) => format!("{srid_prefix}{kind} {dims}{tdim}({space}, {})", t.to_text()),
            None => format!("{srid_prefix}{kind} {dims}{tdim}({space})"),
        }
    }
}

fn overlaps_time(a: &Option<Span>, b: &Option<Span>) -> Result<bool> {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b),
        (None, None) => Ok(true),
        _ => Ok(false),
    }
}

fn zip_opt(a: Option<f64>, b: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_box(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> STBox {
        STBox::new(xmin, xmax, ymin, ymax, None, None, None, 4326, false).unwrap()
    }

    #[test]
    fn overlap_and_contains_on_2d_boxes() {
        let a = plain_box(0.0, 10.0, 0.0, 10.0);
        let b = plain_box(5.0, 15.0, 5.0, 15.0);
        assert!(a.overlaps(&b).unwrap());
        assert!(!a.contains(&b).unwrap());
        let c = plain_box(2.0, 4.0, 2.0, 4.0);
        assert!(a.contains(&c).unwrap());
    }

    #[test]
    fn mismatched_srid_is_rejected() {
        let a = plain_box(0.0, 1.0, 0.0, 1.0);
        let b = STBox::new(0.0, 1.0, 0.0, 1.0, None, None, None, 3857, false).unwrap();
        assert_eq!(a.overlaps(&b).unwrap_err(), TemporalError::MixedSRID(4326, 3857));
    }

    #[test]
    fn quad_split_produces_four_quadrants_in_2d() {
        let a = plain_box(0.0, 10.0, 0.0, 10.0);
        let parts = a.quad_split();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].xmax, 5.0);
    }

    #[test]
    fn geometry_conversion_round_trips_the_bbox_and_carries_wkb_through() {
        let g = GeometryValue {
            srid: 4326,
            geodetic: false,
            wkb: vec![0x01, 0x02, 0x03],
            bbox: GeomBbox { xmin: 0.0, ymin: 1.0, xmax: 2.0, ymax: 3.0, zmin: None, zmax: None },
        };
        let b = STBox::from_geometry(&g).unwrap();
        assert_eq!(b.xmin, 0.0);
        assert_eq!(b.ymax, 3.0);
        assert!(!b.has_z());

        let back = b.to_geometry(g.wkb.clone()).unwrap();
        assert_eq!(back.bbox, g.bbox);
        assert_eq!(back.wkb, g.wkb);
        assert_eq!(back.srid, g.srid);
    }
}
