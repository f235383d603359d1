use crate::error::SpaceError;


/// Online weight scheme as defined in:
/// Sahlgren et al. (2016) The Gavagai Living Lexicon, LREC
///
/// `weight = exp(-theta * freq / uniq)`, recomputed on every observation so the
/// same word weighs less as it keeps showing up in the stream.
#[derive(Clone, Copy, Debug)]
pub struct OnlineWeighter {
    theta: f64,
}

impl OnlineWeighter {

    pub fn new(theta: f64) -> Result<OnlineWeighter, SpaceError> {
        if !theta.is_finite() || theta <= 0.0 {
            return Err(SpaceError::InvalidTheta(theta));
        }
        Ok(Self { theta })
    }

    pub fn weight(&self, freq: usize, uniq: usize) -> f32 {

        // before anything has been seen there is nothing to normalize by,
        // and an unseen word has freq 0 anyway
        let uniq = uniq.max(1) as f64;
        let weight = (-self.theta * (freq as f64 / uniq)).exp();

        // keep the weight strictly positive even when exp underflows f32
        (weight as f32).max(f32::MIN_POSITIVE)
    }
}
