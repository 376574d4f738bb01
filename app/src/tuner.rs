use core::fmt::Write;

use capscan::TunerLink;

use crate::sensor::TscSensor;
use crate::serial::uart1;

/// Streams electrode deltas for threshold tuning, one line per processed scan
#[derive(Default)]
pub struct SerialTuner;

impl TunerLink<TscSensor> for SerialTuner {
    fn sync(&mut self, sensor: &mut TscSensor) {
        let d = sensor.slider().deltas();
        let g = sensor.ganged().deltas();
        let mut w = uart1::writer();
        let _ = write!(
            w,
            "TUNE {} {} {} {} {}\r\n",
            d[0],
            d[1],
            d[2],
            g[0],
            sensor.slider().last_position()
        );
    }
}
