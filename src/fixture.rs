//! Fixtures for tests
use crate::case::Case;
use crate::input::dat::parse_dat;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A two-hour case in which only contract C1 can be taken.
///
/// C2 would breach the hedge rate. Taking C1 means buying 5 units on the spot market in H2.
pub const SIMPLE_CASE_DAT: &str = "# Two-hour case used in tests
set HORAS := H1 H2;
set CONTRATOS := C1 C2;
set PRY_RER := Solar;

param DemandaPortafolioActual :=
H1 50
H2 50
;

param DemandaPPA: C1 C2 :=
H1 10 20
H2 10 20
;

param Produccion_Convencional :=
H1 60
H2 35
;

param Produccion_RER: Solar :=
H1 20
H2 20
;

param PrecioPPA :=
C1 70
C2 40
;

param PrecioSpot :=
H1 60
H2 80
;

param HedgeRate = 0.9;
";

/// A single-hour case with four profitable contracts, of which at most three can be chosen
pub const CARDINALITY_CASE_DAT: &str = "set HORAS := H1;
set CONTRATOS := C1 C2 C3 C4;
set PRY_RER := Wind;
param DemandaPortafolioActual := H1 0;
param DemandaPPA: C1 C2 C3 C4 :=
H1 10 10 10 10
;
param Produccion_Convencional := H1 50;
param Produccion_RER: Wind :=
H1 50
;
param PrecioPPA := C1 10 C2 20 C3 30 C4 40;
param PrecioSpot := H1 1;
param HedgeRate = 1.0;
";

/// Build a case from the contents of a data file
pub fn case_from_str(name: &str, text: &str) -> Case {
    Case::from_dat(name, &parse_dat(text).unwrap()).unwrap()
}

#[fixture]
pub fn simple_case() -> Case {
    case_from_str("simple.dat", SIMPLE_CASE_DAT)
}

#[fixture]
pub fn cardinality_case() -> Case {
    case_from_str("cardinality.dat", CARDINALITY_CASE_DAT)
}

/// The simple case with the hedge rate lowered so that even the existing portfolio breaches it
#[fixture]
pub fn infeasible_case() -> Case {
    let text = SIMPLE_CASE_DAT.replace("HedgeRate = 0.9", "HedgeRate = 0.5");
    case_from_str("infeasible.dat", &text)
}
