use crate::error::BacktestError;
use crate::harvester::Harvester;
use crate::sentinel::Sentinel;
use crate::vector::Vector;
use crate::Robot;
use configuration::RobotSettings;
use core_types::RobotId;

/// Creates a new robot instance based on the provided ID and configuration.
///
/// Every call returns a robot with fresh indicator state.
pub fn create_robot(
    id: RobotId,
    settings: &RobotSettings,
) -> Result<Box<dyn Robot>, BacktestError> {
    match id {
        RobotId::Sentinel => Ok(Box::new(Sentinel::new(settings.sentinel.clone())?)),
        RobotId::Vector => Ok(Box::new(Vector::new(settings.vector.clone())?)),
        RobotId::Harvester => Ok(Box::new(Harvester::new(settings.harvester.clone())?)),
    }
}
