//! The case tree exposed by the solver's settings service.
//!
//! Mirrors the server-side settings schema. Type ids are snake_case; child
//! names match the remote's segment names exactly.

use std::sync::{Arc, OnceLock};

use super::{ChildDecl as C, SchemaDescriptor, Signature as S, TypeDecl as T};
use crate::model::{Path, ValueKind as K};

/// Type id of the builtin root container.
pub const ROOT_TYPE: &str = "case";

/// Path at which the solver mounts the builtin root container.
pub fn root_path() -> Path {
    Path::root().join("Case")
}

/// The process-wide builtin descriptor.
pub fn builtin() -> Arc<SchemaDescriptor> {
    static SCHEMA: OnceLock<Arc<SchemaDescriptor>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| Arc::new(SchemaDescriptor::new(ROOT_TYPE, types())))
        .clone()
}

const UNBOUNDED: f64 = f64::MAX;

fn types() -> Vec<T> {
    vec![
        T::new("case")
            .container("App", "app")
            .container("File", "file"),
        T::new("file")
            .param("DefaultDirectory", K::String)
            .child(C::parameter("CompressionLevel", K::Int).range(0.0, 9.0))
            .command(
                "Read",
                S::new()
                    .arg("file_name", K::String)
                    .optional("kind", K::String)
                    .returns(K::Bool),
            )
            .command(
                "Write",
                S::new()
                    .arg("file_name", K::String)
                    .optional("overwrite", K::Bool)
                    .returns(K::Bool),
            ),
        T::new("app")
            .container("GlobalSettings", "global_settings")
            .container("Physics", "physics")
            .named("Materials", "material")
            .named("BC", "boundary_condition")
            .container("ReferenceValues", "reference_values")
            .container("Mesh", "mesh")
            .container("Solution", "solution")
            .container("Results", "results")
            .child(C::container("Parallel", "parallel").advanced()),
        T::new("global_settings")
            .child(C::parameter("PlotInterval", K::Int).range(1.0, 1.0e6))
            .param("CFFOutput", K::Bool)
            .child(C::parameter("AutoSaveInterval", K::Int).range(0.0, 1.0e9))
            .child(C::parameter("Precision", K::String).allowed(&["single", "double"]))
            .child(C::parameter("UnitSystem", K::String).allowed(&["si", "british", "cgs"]))
            .param("OutputDirectory", K::String)
            .param("Description", K::String)
            .child(C::parameter("ResidualTolerance", K::Float).range(0.0, 1.0))
            .child(C::parameter("ExperimentalSolver", K::Bool).beta())
            .child(C::parameter("Journal", K::StringList).advanced()),
        // Physics
        T::new("physics")
            .container("Solver", "solver")
            .container("Turbulence", "turbulence")
            .container("Energy", "energy")
            .container("Gravity", "gravity")
            .child(C::container("Multiphase", "multiphase").beta()),
        T::new("solver")
            .child(
                C::parameter("Type", K::String).allowed(&["pressure-based", "density-based"]),
            )
            .child(C::parameter("Time", K::String).allowed(&["steady", "transient"]))
            .child(C::parameter("TimeStep", K::Float).range(0.0, 1.0e6))
            .child(C::parameter("MaxIterations", K::Int).range(1.0, 1.0e9))
            .child(C::parameter("CourantNumber", K::Float).range(0.0, 1.0e4))
            .child(
                C::parameter("VelocityFormulation", K::String).allowed(&["absolute", "relative"]),
            ),
        T::new("turbulence")
            .child(C::parameter("Model", K::String).allowed(&[
                "laminar",
                "spalart-allmaras",
                "k-epsilon",
                "k-omega-sst",
                "les",
            ]))
            .child(
                C::parameter("WallTreatment", K::String)
                    .allowed(&["standard", "enhanced", "scalable"]),
            )
            .child(C::parameter("Coefficients", K::Mapping).advanced())
            .param("CurvatureCorrection", K::Bool)
            .child(C::parameter("ProductionLimiter", K::Bool).advanced()),
        T::new("energy")
            .param("Enabled", K::Bool)
            .param("ViscousHeating", K::Bool)
            .child(C::parameter("PressureWork", K::Bool).advanced()),
        T::new("gravity")
            .param("Enabled", K::Bool)
            .param("Vector", K::FloatList),
        T::new("multiphase")
            .child(
                C::parameter("Model", K::String)
                    .allowed(&["none", "vof", "mixture", "eulerian"]),
            )
            .child(C::parameter("PhaseCount", K::Int).range(1.0, 20.0))
            .param("Phases", K::StringList),
        T::new("material")
            .child(C::parameter("Type", K::String).allowed(&["fluid", "solid"]))
            .child(C::parameter("Density", K::Float).range(0.0, 1.0e5))
            .child(C::parameter("Viscosity", K::Float).range(0.0, 1.0e3))
            .child(C::parameter("ThermalConductivity", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("SpecificHeat", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MolecularWeight", K::Float).range(0.0, UNBOUNDED))
            .param("ChemicalFormula", K::String)
            .child(C::parameter("Properties", K::Mapping).advanced())
            .command(
                "CopyFrom",
                S::new().arg("database_name", K::String).returns(K::Bool),
            ),
        // Boundary conditions
        T::new("boundary_condition")
            .child(C::parameter("Type", K::String).allowed(&[
                "velocity-inlet",
                "pressure-inlet",
                "mass-flow-inlet",
                "pressure-outlet",
                "wall",
                "symmetry",
                "far-field",
            ]))
            .param("Zones", K::StringList)
            .param("Velocity", K::FloatList)
            .child(C::parameter("VelocityMagnitude", K::Float).range(0.0, 1.0e4))
            .param("Pressure", K::Float)
            .child(C::parameter("Temperature", K::Float).range(0.0, 1.0e5))
            .child(C::parameter("TurbulentIntensity", K::Float).range(0.0, 1.0))
            .child(C::parameter("TurbulentViscosityRatio", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MassFlowRate", K::Float).range(0.0, UNBOUNDED))
            .container("Wall", "wall_settings")
            .command("CopyTo", S::new().arg("targets", K::StringList).returns(K::Bool))
            .command("Reset", S::new()),
        T::new("wall_settings")
            .child(C::parameter("Motion", K::String).allowed(&["stationary", "moving"]))
            .child(
                C::parameter("ShearCondition", K::String)
                    .allowed(&["no-slip", "specified-shear", "slip"]),
            )
            .child(C::parameter("Roughness", K::Float).range(0.0, 1.0))
            .param("WallVelocity", K::FloatList),
        // Reference values
        T::new("reference_values")
            .child(C::parameter("Area", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("Length", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("Density", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("Velocity", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("Temperature", K::Float).range(0.0, UNBOUNDED))
            .param("Pressure", K::Float)
            .child(C::parameter("Viscosity", K::Float).range(0.0, UNBOUNDED))
            .param("Zone", K::String)
            .container("AirDirection", "air_direction"),
        T::new("air_direction")
            .child(C::parameter("AngleOfAttack", K::Float).read_only())
            .child(C::parameter("SideslipAngle", K::Float).read_only())
            .child(C::parameter("Magnitude", K::Float).read_only())
            .child(C::parameter("LiftAxis", K::String).allowed(&["X", "Y", "Z"]).read_only())
            .child(C::parameter("DragAxis", K::String).allowed(&["X", "Y", "Z"]).read_only())
            .command(
                "SetAirDirection",
                S::new()
                    .arg("aoa", K::Float)
                    .arg("aos", K::Float)
                    .arg("mag", K::Float)
                    .arg("lift", K::String)
                    .arg("drag", K::String)
                    .returns(K::Bool),
            )
            .command("Reset", S::new()),
        // Mesh
        T::new("mesh")
            .child(C::parameter("CellCount", K::Int).read_only())
            .child(C::parameter("NodeCount", K::Int).read_only())
            .child(C::parameter("FaceZones", K::StringList).read_only())
            .child(C::parameter("CellZones", K::StringList).read_only())
            .param("Scale", K::FloatList)
            .child(C::parameter("Units", K::String).allowed(&["m", "cm", "mm", "in", "ft"]))
            .named("Refinement", "refinement_region")
            .command("Check", S::new().returns(K::Mapping))
            .command("ScaleBy", S::new().arg("factors", K::FloatList).returns(K::Bool))
            .child(C::command("Reorder", S::new()).advanced()),
        T::new("refinement_region")
            .child(C::parameter("Shape", K::String).allowed(&["box", "sphere", "cylinder"]))
            .param("Center", K::FloatList)
            .param("Extents", K::FloatList)
            .child(C::parameter("Level", K::Int).range(0.0, 10.0))
            .param("Active", K::Bool),
        // Solution
        T::new("solution")
            .container("Methods", "methods")
            .container("Controls", "controls")
            .container("Monitors", "monitors")
            .container("Initialization", "initialization")
            .container("RunCalculation", "run_calculation")
            .child(C::container("CalculationActivities", "calculation_activities").advanced()),
        T::new("methods")
            .child(
                C::parameter("PressureVelocityCoupling", K::String)
                    .allowed(&["simple", "simplec", "piso", "coupled"]),
            )
            .child(C::parameter("GradientScheme", K::String).allowed(&[
                "green-gauss-cell",
                "green-gauss-node",
                "least-squares",
            ]))
            .child(C::parameter("PressureScheme", K::String).allowed(&[
                "standard",
                "second-order",
                "presto",
                "body-force-weighted",
            ]))
            .child(C::parameter("MomentumOrder", K::Int).range(1.0, 3.0))
            .param("PseudoTransient", K::Bool)
            .child(C::parameter("HighOrderRelaxation", K::Bool).advanced()),
        T::new("controls")
            .param("UnderRelaxation", K::Mapping)
            .child(C::parameter("CourantNumber", K::Float).range(0.0, 1.0e4))
            .child(C::container("Limits", "limits").advanced()),
        T::new("limits")
            .child(C::parameter("MinAbsolutePressure", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MaxAbsolutePressure", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MinTemperature", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MaxTemperature", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("MaxTurbulentViscosityRatio", K::Float).range(0.0, UNBOUNDED)),
        T::new("monitors")
            .container("Residuals", "residuals")
            .named("ReportDefinitions", "report_definition")
            .container("ConvergenceConditions", "convergence_conditions"),
        T::new("residuals")
            .param("Plot", K::Bool)
            .param("Print", K::Bool)
            .param("Criteria", K::FloatList)
            .param("CheckConvergence", K::Bool)
            .child(C::parameter("Equations", K::StringList).read_only()),
        T::new("report_definition")
            .child(C::parameter("Type", K::String).allowed(&[
                "surface-area-average",
                "mass-flow-rate",
                "force",
                "drag",
                "lift",
                "volume-average",
            ]))
            .param("Field", K::String)
            .param("Zones", K::StringList)
            .param("PerZone", K::Bool)
            .param("ForceVector", K::FloatList)
            .command("Compute", S::new().returns(K::Mapping)),
        T::new("convergence_conditions")
            .param("Enabled", K::Bool)
            .child(C::parameter("Frequency", K::Int).range(1.0, 1.0e6))
            .param("Conditions", K::Mapping),
        T::new("initialization")
            .child(C::parameter("Method", K::String).allowed(&["standard", "hybrid", "fmg"]))
            .child(
                C::parameter("ReferenceFrame", K::String).allowed(&["relative", "absolute"]),
            )
            .param("Defaults", K::Mapping)
            .command("Initialize", S::new().returns(K::Bool))
            .command(
                "Patch",
                S::new()
                    .arg("variable", K::String)
                    .arg("zones", K::StringList)
                    .arg("value", K::Float)
                    .returns(K::Bool),
            ),
        T::new("run_calculation")
            .child(C::parameter("IterationCount", K::Int).range(0.0, 1.0e9))
            .child(C::parameter("TimeStepCount", K::Int).range(0.0, 1.0e9))
            .child(C::parameter("MaxIterationsPerStep", K::Int).range(1.0, 1.0e6))
            .child(C::parameter("ReportingInterval", K::Int).range(1.0, 1.0e6))
            .command("Iterate", S::new().optional("count", K::Int).returns(K::Int))
            .command(
                "DualTimeIterate",
                S::new()
                    .arg("steps", K::Int)
                    .optional("max_iterations", K::Int)
                    .returns(K::Int),
            )
            .command("Interrupt", S::new()),
        T::new("calculation_activities")
            .container("AutoSave", "autosave")
            .named("ExecuteCommands", "execute_command"),
        T::new("autosave")
            .child(C::parameter("Frequency", K::Int).range(0.0, 1.0e6))
            .child(C::parameter("MaxFiles", K::Int).range(0.0, 1.0e4))
            .param("RootName", K::String)
            .param("SaveDataOnly", K::Bool),
        T::new("execute_command")
            .param("Command", K::String)
            .child(C::parameter("Frequency", K::Int).range(1.0, 1.0e6))
            .child(C::parameter("When", K::String).allowed(&["iteration", "time-step"]))
            .param("Active", K::Bool),
        // Results
        T::new("results")
            .container("Graphics", "graphics")
            .named("Surfaces", "surface")
            .container("Reports", "reports")
            .container("Export", "export"),
        T::new("graphics")
            .named("Contours", "contour")
            .named("Vectors", "vector_plot"),
        T::new("contour")
            .param("Field", K::String)
            .param("Surfaces", K::StringList)
            .param("Filled", K::Bool)
            .param("NodeValues", K::Bool)
            .param("Range", K::FloatList)
            .child(
                C::parameter("Colormap", K::String)
                    .allowed(&["viridis", "jet", "grayscale", "rainbow"]),
            )
            .command("Display", S::new().returns(K::Bool)),
        T::new("vector_plot")
            .param("Field", K::String)
            .param("Surfaces", K::StringList)
            .child(C::parameter("Scale", K::Float).range(0.0, UNBOUNDED))
            .child(C::parameter("Skip", K::Int).range(0.0, 1.0e6))
            .command("Display", S::new().returns(K::Bool)),
        T::new("surface")
            .child(
                C::parameter("Type", K::String)
                    .allowed(&["plane", "iso-surface", "line", "point"]),
            )
            .param("Point", K::FloatList)
            .param("Normal", K::FloatList)
            .param("Field", K::String)
            .param("IsoValues", K::FloatList),
        T::new("reports")
            .command("Summary", S::new().returns(K::Mapping))
            .command(
                "Forces",
                S::new()
                    .arg("zones", K::StringList)
                    .arg("direction", K::FloatList)
                    .returns(K::Mapping),
            )
            .command(
                "Fluxes",
                S::new()
                    .arg("zones", K::StringList)
                    .optional("quantity", K::String)
                    .returns(K::Mapping),
            ),
        T::new("export")
            .child(
                C::parameter("Format", K::String)
                    .allowed(&["cgns", "ensight", "vtk", "csv", "tecplot"]),
            )
            .param("Fields", K::StringList)
            .param("Surfaces", K::StringList)
            .param("Binary", K::Bool)
            .command(
                "Write",
                S::new()
                    .arg("file_name", K::String)
                    .optional("overwrite", K::Bool)
                    .returns(K::String),
            ),
        T::new("parallel")
            .child(C::parameter("ProcessCount", K::Int).read_only())
            .child(
                C::parameter("Partitioning", K::String)
                    .allowed(&["metis", "principal-axes", "cartesian"]),
            )
            .param("LoadBalance", K::Bool)
            .command("Partition", S::new().arg("count", K::Int).returns(K::Bool)),
    ]
}
