// ef-core/src/units.rs

use uom::si::f64::{Energy as UomEnergy, Power as UomPower, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Energy = UomEnergy;
pub type Power = UomPower;
pub type Time = UomTime;

#[inline]
pub fn mj(v: f64) -> Energy {
    use uom::si::energy::megajoule;
    Energy::new::<megajoule>(v)
}

#[inline]
pub fn mwh(v: f64) -> Energy {
    use uom::si::energy::kilowatt_hour;
    Energy::new::<kilowatt_hour>(v * 1_000.0)
}

#[inline]
pub fn mw(v: f64) -> Power {
    use uom::si::power::megawatt;
    Power::new::<megawatt>(v)
}

#[inline]
pub fn hours(v: f64) -> Time {
    use uom::si::time::hour;
    Time::new::<hour>(v)
}

/// Energy delivered by a power level sustained over one hourly frame, in MJ.
///
/// Adapters use this at the boundary between the dispatch calculators
/// (which work in MW) and the graph (whose demands are MJ).
#[inline]
pub fn frame_energy_mj(power: Power) -> f64 {
    use uom::si::energy::megajoule;
    (power * hours(1.0)).get::<megajoule>()
}

/// Convert a yearly production in MWh to MJ.
#[inline]
pub fn mwh_to_mj(v: f64) -> f64 {
    use uom::si::energy::megajoule;
    mwh(v).get::<megajoule>()
}
