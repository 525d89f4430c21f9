use crate::particle::Particle;

/// A visible connection between two nearby particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    /// Stroke opacity, always > 0 for an emitted link
    pub opacity: f32,
}

/// Find every unordered pair closer than `threshold_sq` (squared distance).
///
/// Filtering runs on squared distances; the square root is only taken for
/// pairs that pass, to derive an opacity that fades linearly from
/// `max_opacity` at distance zero to nothing at the threshold distance.
/// A particle is never paired with itself.
pub fn proximity_links(particles: &[Particle], threshold_sq: f32, max_opacity: f32) -> Vec<Link> {
    let limit = threshold_sq.max(0.0).sqrt();
    let mut links = Vec::new();

    for (i, p1) in particles.iter().enumerate() {
        for (offset, p2) in particles[i + 1..].iter().enumerate() {
            let dist_sq = p1.distance_sq(p2);
            if dist_sq < threshold_sq {
                let fade = 1.0 - dist_sq.sqrt() / limit;
                links.push(Link {
                    a: i,
                    b: i + 1 + offset,
                    opacity: (max_opacity * fade).max(f32::MIN_POSITIVE),
                });
            }
        }
    }

    links
}
