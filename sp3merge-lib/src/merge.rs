use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    sample::{MergedEphemeris, ObjectEphemeris, Sample},
    time::Time,
};

/// Merge the samples for `object_id` from `inputs` into a single time ordered ephemeris.
///
/// Inputs are applied in iteration order and a sample replaces any earlier sample with the
/// same time, i.e., when sources disagree the last one wins. Inputs for other objects are
/// ignored. No interpolation is done and gaps in the inputs remain gaps in the output.
///
/// No inputs at all results in an empty ephemeris.
///
/// # Errors
/// [Error::ObjectNotFound] if there are inputs but none are for `object_id`, and
/// [Error::InconsistentFrame] or [Error::InconsistentTimeSystem] if the matching inputs
/// do not agree on their frame and time system.
pub fn merge<'a, I>(inputs: I, object_id: &str) -> Result<MergedEphemeris>
where
    I: IntoIterator<Item = &'a ObjectEphemeris>,
{
    let mut any_inputs = false;
    let mut matching: Vec<&ObjectEphemeris> = Vec::default();
    for input in inputs {
        any_inputs = true;
        if input.object_id == object_id {
            matching.push(input);
        }
    }

    let Some(first) = matching.first() else {
        if any_inputs {
            return Err(Error::ObjectNotFound(object_id.to_string()));
        }
        return Ok(MergedEphemeris::empty(object_id));
    };

    for input in &matching[1..] {
        if input.frame != first.frame {
            return Err(Error::InconsistentFrame {
                object_id: object_id.to_string(),
                expected: first.frame.clone(),
                found: input.frame.clone(),
            });
        }
        if input.time_system != first.time_system {
            return Err(Error::InconsistentTimeSystem {
                object_id: object_id.to_string(),
                expected: first.time_system,
                found: input.time_system,
            });
        }
    }

    let mut by_time: HashMap<Time, &Sample> = HashMap::default();
    for input in &matching {
        for sample in &input.samples {
            by_time.insert(sample.time, sample);
        }
    }

    let mut samples: Vec<Sample> = by_time.into_values().cloned().collect();
    samples.sort_unstable_by(|a, b| a.time.cmp(&b.time));

    Ok(MergedEphemeris {
        object_id: object_id.to_string(),
        frame: first.frame.clone(),
        time_system: first.time_system,
        samples,
    })
}
