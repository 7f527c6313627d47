use planar_core::{
    nalgebra::{Matrix3, Point2, SMatrix, SVector},
    sample_consensus::Estimator,
    FeatureMatch, Homography,
};

/// Similarity transform that moves the centroid of `points` to the origin and scales them so
/// the mean distance from the origin is `sqrt(2)`.
fn conditioning<I>(points: I) -> Option<Matrix3<f64>>
where
    I: Iterator<Item = Point2<f64>> + Clone,
{
    let (count, sum) = points
        .clone()
        .fold((0usize, Point2::<f64>::origin().coords), |(n, sum), p| (n + 1, sum + p.coords));
    if count == 0 {
        return None;
    }
    let centroid = sum / count as f64;
    let mean_distance = points.map(|p| (p.coords - centroid).norm()).sum::<f64>() / count as f64;
    if !mean_distance.is_normal() {
        return None;
    }
    let scale = core::f64::consts::SQRT_2 / mean_distance;
    Some(Matrix3::new(
        scale,
        0.0,
        -scale * centroid.x,
        0.0,
        scale,
        -scale * centroid.y,
        0.0,
        0.0,
        1.0,
    ))
}

fn condition(transform: &Matrix3<f64>, point: Point2<f64>) -> Point2<f64> {
    transform.transform_point(&point)
}

/// Accumulates `A^T A` for the direct linear transform system `A h = 0`.
///
/// Each correspondence contributes two rows of `A`. Accumulating the normal matrix directly
/// keeps the system at 9x9 regardless of the number of matches.
fn encode_homography_equations(
    matches: impl Iterator<Item = FeatureMatch>,
    source: &Matrix3<f64>,
    target: &Matrix3<f64>,
) -> SMatrix<f64, 9, 9> {
    let mut normal = SMatrix::<f64, 9, 9>::zeros();
    for FeatureMatch(a, b) in matches {
        let a = condition(source, a);
        let b = condition(target, b);
        let (x, y, u, v) = (a.x, a.y, b.x, b.y);
        let rows = [
            SVector::<f64, 9>::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]),
            SVector::<f64, 9>::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]),
        ];
        for row in &rows {
            normal += row * row.transpose();
        }
    }
    normal
}

/// Estimates a [`Homography`] with the normalized
/// [direct linear transform](https://en.wikipedia.org/wiki/Direct_linear_transformation)
/// described by Richard Hartley and Andrew Zisserman.
///
/// The estimated homography maps the first point of every [`FeatureMatch`] onto the second one
/// and is normalized so its bottom-right element is `1.0`. Four matches determine it exactly;
/// more matches are fitted in the least-squares sense.
#[derive(Copy, Clone, Debug)]
pub struct FourPoint {
    pub epsilon: f64,
    pub iterations: usize,
}

impl FourPoint {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_matches<I>(&self, data: I) -> Option<Homography>
    where
        I: Iterator<Item = FeatureMatch> + Clone,
    {
        let source = conditioning(data.clone().map(|FeatureMatch(a, _)| a))?;
        let target = conditioning(data.clone().map(|FeatureMatch(_, b)| b))?;
        let normal = encode_homography_equations(data, &source, &target);
        let eigens = normal.try_symmetric_eigen(self.epsilon, self.iterations)?;
        let eigenvector = eigens
            .eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| float_ord::FloatOrd(n))
            .map(|(ix, _)| eigens.eigenvectors.column(ix).into_owned())?;
        let conditioned = Matrix3::from_row_slice(eigenvector.as_slice());
        let homography = target.try_inverse()? * conditioned * source;
        if homography.iter().any(|x| !x.is_finite()) {
            return None;
        }
        Homography(homography).normalized()
    }
}

impl Default for FourPoint {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
        }
    }
}

impl Estimator<FeatureMatch> for FourPoint {
    type Model = Homography;
    type ModelIter = Option<Homography>;
    const MIN_SAMPLES: usize = 4;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = FeatureMatch> + Clone,
    {
        self.from_matches(data)
    }
}
