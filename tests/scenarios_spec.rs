use std::sync::Arc;

use settings_tree::schema::{self, builtin};
use settings_tree::{ErrorKind, InMemoryService, Path, Segment, Tree, TreeBuilder, Value, ValueKind};
use speculate2::speculate;

fn path(s: &str) -> Path {
    s.parse().expect("valid path")
}

fn bind(service: &Arc<InMemoryService>) -> Tree {
    TreeBuilder::new(service.clone(), schema::builtin())
        .root_path(builtin::root_path())
        .build()
        .expect("builtin schema binds")
}

fn air_direction_args(aoa: f64) -> Vec<(&'static str, Value)> {
    vec![
        ("aoa", Value::from(aoa)),
        ("aos", Value::from(0.0)),
        ("mag", Value::from(75.0)),
        ("lift", Value::from("Y")),
        ("drag", Value::from("X")),
    ]
}

speculate! {
    before {
        let service = Arc::new(InMemoryService::builtin());
        let tree = bind(&service);
        let app = tree.root().container("App").expect("App container");
    }

    describe "reading a parameter" {
        it "returns the remote value with the declared kind" {
            service.seed(&path("/Case/App/GlobalSettings/PlotInterval"), 25).expect("seed");

            let interval = app
                .container("GlobalSettings").expect("GlobalSettings")
                .parameter("PlotInterval").expect("PlotInterval");

            let value = interval.read().expect("read");
            assert_eq!(value, Value::Int(25));
            assert_eq!(value.kind(), ValueKind::Int);
            assert_eq!(interval.path().to_string(), "/Case/App/GlobalSettings/PlotInterval");
        }
    }

    describe "writing a parameter" {
        it "reads back what was written" {
            let output = app
                .container("GlobalSettings").expect("GlobalSettings")
                .parameter("CFFOutput").expect("CFFOutput");

            output.write(true).expect("write");
            assert_eq!(output.read().expect("read"), Value::Bool(true));
        }

        it "rejects a string for a float parameter without contacting the service" {
            let area = app
                .container("ReferenceValues").expect("ReferenceValues")
                .parameter("Area").expect("Area");
            let before = service.call_count();

            let err = area.write("fast").unwrap_err();

            assert_eq!(err.kind(), ErrorKind::KindMismatch);
            assert!(err.to_string().contains("string \"fast\""));
            assert_eq!(service.call_count(), before);
        }
    }

    describe "named objects" {
        it "addresses instances with a keyed path segment" {
            let bc = app.named_objects("BC").expect("BC");
            let inlet = bc.lookup("inlet-1").expect("lookup");

            assert_eq!(inlet.path().last(), Some(&Segment::keyed("BC", "inlet-1")));
            assert_eq!(inlet.path().to_string(), "/Case/App/BC/BC[inlet-1]");
            assert_eq!(inlet.type_id(), bc.element_type());
            assert_eq!(bc.element_type(), "boundary_condition");
        }

        it "lists keys in the order the remote reports them" {
            let bc = app.named_objects("BC").expect("BC");
            service.create_object(bc.path(), "inlet-1").expect("create");
            service.create_object(bc.path(), "inlet-2").expect("create");

            assert_eq!(bc.keys().expect("keys"), vec!["inlet-1", "inlet-2"]);
        }
    }

    describe "invoking a command" {
        before {
            let set_air_direction = app
                .container("ReferenceValues").expect("ReferenceValues")
                .container("AirDirection").expect("AirDirection")
                .command("SetAirDirection").expect("SetAirDirection");
            service.on_command(set_air_direction.path(), |_| Ok(Some(Value::Bool(true))));
        }

        it "returns the declared result kind" {
            let result = set_air_direction.invoke(air_direction_args(2.5)).expect("invoke");
            assert_eq!(result, Some(Value::Bool(true)));
        }

        it "rejects missing arguments without contacting the service" {
            let before = service.call_count();

            let err = set_air_direction.invoke([("aoa", Value::from(2.5))]).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
            assert!(err.to_string().contains("aos"));
            assert_eq!(service.call_count(), before);
        }
    }

    describe "after detach" {
        before {
            let interval = app
                .container("GlobalSettings").expect("GlobalSettings")
                .parameter("PlotInterval").expect("PlotInterval");
            let bc = app.named_objects("BC").expect("BC");
            let reset = app
                .container("ReferenceValues").expect("ReferenceValues")
                .container("AirDirection").expect("AirDirection")
                .command("Reset").expect("Reset");
            tree.detach();
        }

        it "fails every terminal operation with ServiceClosed" {
            let before = service.call_count();

            assert_eq!(interval.read().unwrap_err().kind(), ErrorKind::ServiceClosed);
            assert_eq!(interval.write(10).unwrap_err().kind(), ErrorKind::ServiceClosed);
            assert_eq!(
                reset.invoke(Vec::<(String, Value)>::new()).unwrap_err().kind(),
                ErrorKind::ServiceClosed
            );
            assert_eq!(bc.keys().unwrap_err().kind(), ErrorKind::ServiceClosed);

            assert_eq!(service.call_count(), before);
        }

        it "still allows navigation" {
            let bc_again = app.named_objects("BC").expect("BC");
            assert!(bc_again.same_node(&bc));
            assert!(bc.lookup("outlet").is_ok());
        }
    }
}
