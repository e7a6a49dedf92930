//! Coordinate frame conversion by composing rotation matrices along the
//! shortest path of a small frame graph.
//!
//! Points are unit direction vectors; see [`direction`] and [`spherical`].
//! Angles are radians throughout.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::error::{Error, Result};

/// Celestial and local reference frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    /// Azimuth and altitude.
    Horizon,
    /// Hour angle and declination.
    EquatorialHourAngle,
    /// Right ascension and declination.
    EquatorialRaDec,
    Ecliptic,
    Galactic,
}

impl Frame {
    pub const ALL: [Frame; 5] = [
        Frame::Horizon,
        Frame::EquatorialHourAngle,
        Frame::EquatorialRaDec,
        Frame::Ecliptic,
        Frame::Galactic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Frame::Horizon => "horizon",
            Frame::EquatorialHourAngle => "equatorial hour angle",
            Frame::EquatorialRaDec => "equatorial right ascension",
            Frame::Ecliptic => "ecliptic",
            Frame::Galactic => "galactic",
        }
    }
}

/// Equatorial (B1950) to galactic rotation. The third row is the galactic
/// north pole.
const RA_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.0669887, -0.8727558, -0.4835389],
    [0.4927285, -0.4503470, 0.7445846],
    [-0.8676008, -0.1883746, 0.4601998],
];

#[derive(Debug, Clone, PartialEq)]
struct Edge {
    from: Frame,
    to: Frame,
    rotation: Matrix3<f64>,
}

/// Directed graph of frames with a rotation on every edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionGraph {
    frames: Vec<Frame>,
    edges: Vec<Edge>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five-frame graph for an observer at latitude `phi`, local
    /// sidereal time `sidereal_time` and ecliptic `obliquity`.
    pub fn standard(phi: f64, sidereal_time: f64, obliquity: f64) -> Self {
        let (sin_phi, cos_phi) = (libm::sin(phi), libm::cos(phi));
        let (sin_st, cos_st) = (libm::sin(sidereal_time), libm::cos(sidereal_time));
        let (sin_e, cos_e) = (libm::sin(obliquity), libm::cos(obliquity));

        #[rustfmt::skip]
        let horizon = Matrix3::new(
            -sin_phi, 0.0, cos_phi,
            0.0, -1.0, 0.0,
            cos_phi, 0.0, sin_phi,
        );
        #[rustfmt::skip]
        let hour_angle = Matrix3::new(
            cos_st, sin_st, 0.0,
            sin_st, -cos_st, 0.0,
            0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let ecliptic = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, cos_e, -sin_e,
            0.0, sin_e, cos_e,
        );
        let galactic = Matrix3::from_fn(|r, c| RA_TO_GALACTIC[r][c]);

        let mut graph = Self::new();
        graph.add_edge(Frame::Horizon, Frame::EquatorialHourAngle, horizon);
        graph.add_edge(Frame::EquatorialHourAngle, Frame::Horizon, horizon);
        graph.add_edge(Frame::EquatorialHourAngle, Frame::EquatorialRaDec, hour_angle);
        graph.add_edge(Frame::EquatorialRaDec, Frame::EquatorialHourAngle, hour_angle);
        graph.add_edge(Frame::Ecliptic, Frame::EquatorialRaDec, ecliptic);
        graph.add_edge(Frame::EquatorialRaDec, Frame::Ecliptic, ecliptic.transpose());
        graph.add_edge(Frame::EquatorialRaDec, Frame::Galactic, galactic);
        graph.add_edge(Frame::Galactic, Frame::EquatorialRaDec, galactic.transpose());
        graph
    }

    /// Add a directed edge. Both endpoints become vertices.
    pub fn add_edge(&mut self, from: Frame, to: Frame, rotation: Matrix3<f64>) {
        for frame in [from, to] {
            if !self.frames.contains(&frame) {
                self.frames.push(frame);
            }
        }
        self.edges.push(Edge { from, to, rotation });
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.frames.contains(&frame)
    }

    /// Fewest-edge route from `from` to `to`, both ends included.
    pub fn path(&self, from: Frame, to: Frame) -> Result<Vec<Frame>> {
        for frame in [from, to] {
            if !self.contains(frame) {
                return Err(Error::UnknownFrame(frame.name()));
            }
        }

        let mut previous: Vec<Option<Frame>> = vec![None; self.frames.len()];
        let mut seen = vec![false; self.frames.len()];
        let mut queue = VecDeque::new();
        seen[self.slot(from)] = true;
        queue.push_back(from);

        while let Some(frame) = queue.pop_front() {
            if frame == to {
                break;
            }
            for edge in self.edges.iter().filter(|e| e.from == frame) {
                let slot = self.slot(edge.to);
                if !seen[slot] {
                    seen[slot] = true;
                    previous[slot] = Some(frame);
                    queue.push_back(edge.to);
                }
            }
        }

        if !seen[self.slot(to)] {
            return Err(Error::NoConversionPath {
                from: from.name(),
                to: to.name(),
            });
        }

        let mut path = vec![to];
        let mut cursor = to;
        while let Some(prev) = previous[self.slot(cursor)] {
            path.push(prev);
            cursor = prev;
        }
        path.reverse();
        Ok(path)
    }

    /// Single rotation taking `from` vectors to `to` vectors.
    pub fn transform(&self, from: Frame, to: Frame) -> Result<Matrix3<f64>> {
        let path = self.path(from, to)?;
        let mut total = Matrix3::identity();
        for step in path.windows(2) {
            let edge = self
                .edges
                .iter()
                .find(|e| e.from == step[0] && e.to == step[1])
                .ok_or(Error::NoConversionPath {
                    from: step[0].name(),
                    to: step[1].name(),
                })?;
            total = edge.rotation * total;
        }
        debug!(
            from = from.name(),
            to = to.name(),
            steps = path.len() - 1,
            "composed frame rotation"
        );
        Ok(total)
    }

    pub fn convert(&self, from: Frame, to: Frame, point: &Vector3<f64>) -> Result<Vector3<f64>> {
        Ok(self.transform(from, to)? * point)
    }

    fn slot(&self, frame: Frame) -> usize {
        self.frames
            .iter()
            .position(|f| *f == frame)
            .unwrap_or(usize::MAX)
    }
}

/// Convert `point` from `source` to `dest` through the standard graph.
pub fn convert(
    source: Frame,
    dest: Frame,
    phi: f64,
    sidereal_time: f64,
    obliquity: f64,
    point: &Vector3<f64>,
) -> Result<Vector3<f64>> {
    ConversionGraph::standard(phi, sidereal_time, obliquity).convert(source, dest, point)
}

/// Unit vector for longitude `lon` and latitude `lat`.
pub fn direction(lon: f64, lat: f64) -> Vector3<f64> {
    let cos_lat = libm::cos(lat);
    Vector3::new(
        libm::cos(lon) * cos_lat,
        libm::sin(lon) * cos_lat,
        libm::sin(lat),
    )
}

/// `(longitude, latitude)` of a unit vector. Longitude is in `(-pi, pi]`.
pub fn spherical(v: &Vector3<f64>) -> (f64, f64) {
    (libm::atan2(v.y, v.x), libm::asin(v.z.clamp(-1.0, 1.0)))
}
