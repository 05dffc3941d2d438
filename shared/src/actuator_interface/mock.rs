use super::{ActuatorError, ActuatorInterface, ActuatorResult};

/// In-memory actuator that records every commanded move.
pub struct MockActuator {
    position: f64,
    travel_range: Option<(f64, f64)>,
    moves: Vec<f64>,
    fault: Option<String>,
}

impl MockActuator {
    pub fn new(initial_position: f64) -> Self {
        Self {
            position: initial_position,
            travel_range: None,
            moves: Vec::new(),
            fault: None,
        }
    }

    /// Reject moves outside `[min, max]` with [`ActuatorError::OutOfRange`].
    pub fn with_travel_range(mut self, min: f64, max: f64) -> Self {
        self.travel_range = Some((min.min(max), min.max(max)));
        self
    }

    /// Make every subsequent move fail with a hardware fault.
    pub fn set_fault(&mut self, fault: Option<String>) {
        self.fault = fault;
    }

    /// All targets commanded so far, oldest first.
    pub fn moves(&self) -> &[f64] {
        &self.moves
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Jog the motor without recording a commanded move (operator nudge).
    pub fn jog_to(&mut self, position: f64) {
        self.position = position;
    }

    pub fn reset(&mut self) {
        self.moves.clear();
        self.fault = None;
    }
}

impl ActuatorInterface for MockActuator {
    fn move_to(&mut self, target: f64) -> ActuatorResult<f64> {
        if let Some(fault) = &self.fault {
            return Err(ActuatorError::HardwareFault(fault.clone()));
        }
        if let Some((min, max)) = self.travel_range {
            if target < min || target > max {
                return Err(ActuatorError::OutOfRange { target, min, max });
            }
        }
        self.moves.push(target);
        self.position = target;
        Ok(self.position)
    }

    fn position(&self) -> ActuatorResult<f64> {
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_moves() {
        let mut motor = MockActuator::new(0.0);
        motor.move_to(1.0).unwrap();
        motor.move_to(3.0).unwrap();
        assert_eq!(motor.moves(), &[1.0, 3.0]);
        assert_eq!(motor.position().unwrap(), 3.0);
    }

    #[test]
    fn test_travel_range_rejects() {
        let mut motor = MockActuator::new(0.0).with_travel_range(5.0, -5.0);
        let err = motor.move_to(6.0).unwrap_err();
        assert!(matches!(err, ActuatorError::OutOfRange { .. }));
        assert_eq!(motor.move_count(), 0);
        assert_eq!(motor.position().unwrap(), 0.0);
    }

    #[test]
    fn test_fault_blocks_moves() {
        let mut motor = MockActuator::new(0.0);
        motor.set_fault(Some("encoder lost".to_string()));
        assert_eq!(
            motor.move_to(1.0),
            Err(ActuatorError::HardwareFault("encoder lost".to_string()))
        );
        motor.reset();
        assert_eq!(motor.move_to(1.0), Ok(1.0));
    }

    #[test]
    fn test_jog_is_not_a_commanded_move() {
        let mut motor = MockActuator::new(0.0);
        motor.jog_to(4.0);
        assert_eq!(motor.position().unwrap(), 4.0);
        assert!(motor.moves().is_empty());
    }
}
