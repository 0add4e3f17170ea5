use std::sync::Arc;
use std::thread;

use settings_tree::schema::{ChildDecl, Signature, TypeDecl};
use settings_tree::{
    ArgMap, Error, ErrorKind, InMemoryService, Node, Path, SchemaDescriptor, ServiceError,
    ServiceHandle, Tree, TreeBuilder, TreeState, Value, ValueKind,
};
use serde_json::json;
use speculate2::speculate;

fn path(s: &str) -> Path {
    s.parse().expect("valid path")
}

fn solver_schema() -> Arc<SchemaDescriptor> {
    Arc::new(SchemaDescriptor::new(
        "session",
        vec![
            TypeDecl::new("session")
                .container("Setup", "setup")
                .named("Zones", "zone")
                .command(
                    "Iterate",
                    Signature::new().optional("count", ValueKind::Int).returns(ValueKind::Int),
                ),
            TypeDecl::new("setup")
                .param("Iterations", ValueKind::Int)
                .param("Relaxation", ValueKind::Float)
                .param("Weights", ValueKind::FloatList)
                .param("Stages", ValueKind::IntList)
                .param("Labels", ValueKind::StringList)
                .param("Options", ValueKind::Mapping)
                .child(ChildDecl::parameter("Version", ValueKind::String).read_only())
                .child(ChildDecl::parameter("Scheme", ValueKind::String).allowed(&["first", "second"]))
                .child(ChildDecl::parameter("Courant", ValueKind::Float).range(0.0, 100.0))
                .command("Reset", Signature::new()),
            TypeDecl::new("zone")
                .param("Temperature", ValueKind::Float)
                .named("Faces", "face"),
            TypeDecl::new("face").param("Area", ValueKind::Float),
        ],
    ))
}

fn bind(service: &Arc<InMemoryService>) -> Tree {
    TreeBuilder::new(service.clone(), solver_schema())
        .root_path(path("/Session"))
        .build()
        .expect("schema binds")
}

/// A remote that answers every request with a string.
struct StringlyService;

impl ServiceHandle for StringlyService {
    fn get(&self, _: &Path) -> Result<Value, ServiceError> {
        Ok(Value::from("twelve"))
    }

    fn set(&self, _: &Path, _: Value) -> Result<(), ServiceError> {
        Ok(())
    }

    fn invoke(&self, _: &Path, _: ArgMap) -> Result<Option<Value>, ServiceError> {
        Ok(Some(Value::from("done")))
    }

    fn child_keys(&self, _: &Path) -> Result<Vec<String>, ServiceError> {
        Ok(Vec::new())
    }
}

fn assert_send_sync<T: Send + Sync>() {}

speculate! {
    before {
        let service = Arc::new(InMemoryService::new(solver_schema(), path("/Session")));
        let tree = bind(&service);
    }

    describe "building" {
        it "starts bound with the root at the requested path" {
            assert_eq!(tree.state(), TreeState::Bound);
            assert_eq!(tree.root().path().to_string(), "/Session");
            assert_eq!(tree.root().type_id(), "session");
        }

        it "defaults the root path to /" {
            let tree = TreeBuilder::new(service.clone(), solver_schema()).build().expect("build");
            assert!(tree.root().path().is_root());
        }

        it "rejects an inconsistent schema" {
            let broken = Arc::new(SchemaDescriptor::new(
                "session",
                vec![TypeDecl::new("session").container("Setup", "missing")],
            ));
            let err = TreeBuilder::new(service.clone(), broken).build().err().expect("error");
            assert_eq!(err.kind(), ErrorKind::SchemaError);
            assert!(err.to_string().contains("missing"));
        }

        it "does not contact the service" {
            assert_eq!(service.call_count(), 0);
        }
    }

    describe "navigation" {
        it "returns the same node on repeated access" {
            let first = tree.root().container("Setup").expect("Setup");
            let second = tree.root().container("Setup").expect("Setup");
            assert!(first.same_node(&second));

            let p1 = first.parameter("Iterations").expect("Iterations");
            let p2 = second.parameter("Iterations").expect("Iterations");
            assert!(p1.same_node(&p2));
        }

        it "returns the same instance for the same key" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            let a = zones.lookup("hot").expect("hot");
            let b = zones.lookup("hot").expect("hot");
            let c = zones.lookup("Hot").expect("Hot");
            assert!(a.same_node(&b));
            assert!(!a.same_node(&c));
        }

        it "extends the parent path by one segment" {
            let setup = tree.root().container("Setup").expect("Setup");
            let relaxation = setup.parameter("Relaxation").expect("Relaxation");
            assert_eq!(relaxation.path().parent().as_ref(), Some(setup.path()));
            assert_eq!(relaxation.path().len(), setup.path().len() + 1);
        }

        it "builds nested instance paths" {
            let area = tree.root()
                .named_objects("Zones").expect("Zones")
                .lookup("z1").expect("z1")
                .named_objects("Faces").expect("Faces")
                .lookup("top").expect("top")
                .parameter("Area").expect("Area");
            assert_eq!(area.path().to_string(), "/Session/Zones/Zones[z1]/Faces/Faces[top]/Area");
        }

        it "fails with UnknownChild for undeclared names" {
            let err = tree.root().child("Setupp").unwrap_err();
            assert_eq!(
                err,
                Error::UnknownChild { type_id: "session".into(), name: "Setupp".into() }
            );
        }

        it "fails with NodeKind when a child is used as the wrong kind" {
            let err = tree.root().parameter("Setup").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NodeKind);
            assert!(err.to_string().contains("container"));
        }

        it "rejects instance keys that have no text form" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            for key in ["", "a]b", "a/b", "a[b"] {
                assert_eq!(zones.lookup(key).unwrap_err().kind(), ErrorKind::PathNotFound);
            }
            assert!(zones.materialized_keys().is_empty());
        }

        it "gives every instance a path that resolves back to it" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            let zone = zones.lookup("left wing.2").expect("lookup");
            let reparsed: Path = zone.path().to_string().parse().expect("path parses");
            let node = tree.resolve(&reparsed).expect("resolve");
            assert!(node.same_node(&Node::Container(zone)));
        }

        it "lists declared children in schema order" {
            assert_eq!(tree.root().child_names(), vec!["Setup", "Zones", "Iterate"]);
        }

        it "remembers the order instances were first looked up" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            zones.lookup("b").expect("b");
            zones.lookup("a").expect("a");
            zones.lookup("b").expect("b");
            assert_eq!(zones.materialized_keys(), vec!["b", "a"]);
        }

        it "is shareable across threads" {
            assert_send_sync::<Tree>();
            assert_send_sync::<Node>();

            let tree = Arc::new(tree);
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let tree = tree.clone();
                    thread::spawn(move || {
                        tree.root()
                            .named_objects("Zones").expect("Zones")
                            .lookup("shared").expect("shared")
                    })
                })
                .collect();
            let nodes: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread")).collect();
            assert!(nodes.windows(2).all(|w| w[0].same_node(&w[1])));
        }
    }

    describe "resolve" {
        it "finds the node a path names" {
            let node = tree.resolve(&path("/Session/Setup/Iterations")).expect("resolve");
            let direct = tree.root()
                .container("Setup").expect("Setup")
                .parameter("Iterations").expect("Iterations");
            assert!(node.same_node(&Node::Parameter(direct)));
        }

        it "goes through named-object lookup for keyed segments" {
            let node = tree.resolve(&path("/Session/Zones/Zones[z1]/Temperature")).expect("resolve");
            assert_eq!(node.label(), "parameter");
            assert_eq!(
                tree.root().named_objects("Zones").expect("Zones").materialized_keys(),
                vec!["z1"]
            );
        }

        it "returns the root for the root path" {
            let node = tree.resolve(&path("/Session")).expect("resolve");
            assert!(node.same_node(&Node::Container(tree.root().clone())));
        }

        it "rejects paths outside the tree" {
            let err = tree.resolve(&path("/Other/Setup")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PathNotFound);
        }

        it "rejects a key on a singleton container" {
            let err = tree.resolve(&path("/Session/Setup[x]")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PathNotFound);
        }

        it "rejects an undeclared name" {
            let err = tree.resolve(&path("/Session/Nope")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownChild);
        }
    }

    describe "parameters" {
        before {
            let setup = tree.root().container("Setup").expect("Setup");
        }

        it "reads back list and mapping values as written" {
            let options = json!({"scheme": "upwind", "limit": null, "stages": [1, 2.5]});
            let cases = vec![
                ("Weights", Value::FloatList(vec![0.25, 1.5])),
                ("Weights", Value::FloatList(Vec::new())),
                ("Stages", Value::IntList(vec![1, 2, 3])),
                ("Labels", Value::StringList(vec!["inner".into(), "outer wall".into()])),
                ("Options", Value::Mapping(options.as_object().cloned().expect("object"))),
            ];
            for (name, value) in cases {
                let parameter = setup.parameter(name).expect(name);
                parameter.write(value.clone()).expect("write");
                assert_eq!(parameter.read().expect("read"), value);
            }
        }

        it "widens integer lists written to float-list parameters" {
            let weights = setup.parameter("Weights").expect("Weights");
            weights.write(vec![1_i64, 2]).expect("write");
            assert_eq!(weights.read().expect("read"), Value::FloatList(vec![1.0, 2.0]));
        }

        it "widens integers written to float parameters" {
            setup.parameter("Relaxation").expect("Relaxation").write(1).expect("write");
            assert_eq!(service.stored(&path("/Session/Setup/Relaxation")), Some(Value::Float(1.0)));
        }

        it "never narrows floats written to int parameters" {
            let err = setup.parameter("Iterations").expect("Iterations").write(2.5).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::KindMismatch);
            assert_eq!(service.call_count(), 0);
        }

        it "reads the remote value on every call" {
            let iterations = setup.parameter("Iterations").expect("Iterations");
            service.seed(iterations.path(), 10).expect("seed");
            assert_eq!(iterations.read().expect("read"), Value::Int(10));
            service.seed(iterations.path(), 20).expect("seed");
            assert_eq!(iterations.read().expect("read"), Value::Int(20));
            assert_eq!(service.call_count(), 2);
        }

        it "surfaces Immutable for read-only parameters" {
            let err = setup.parameter("Version").expect("Version").write("2.0").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Immutable);
            assert!(err.to_string().contains("/Session/Setup/Version"));
        }

        it "surfaces Validation for values the remote refuses" {
            let scheme = setup.parameter("Scheme").expect("Scheme");
            assert_eq!(scheme.write("third").unwrap_err().kind(), ErrorKind::Validation);

            let courant = setup.parameter("Courant").expect("Courant");
            assert_eq!(courant.write(250.0).unwrap_err().kind(), ErrorKind::Validation);
            courant.write(5).expect("in range");
        }

        it "surfaces PathNotFound for instances the remote does not have" {
            let temperature = tree.root()
                .named_objects("Zones").expect("Zones")
                .lookup("ghost").expect("ghost")
                .parameter("Temperature").expect("Temperature");
            assert_eq!(temperature.read().unwrap_err().kind(), ErrorKind::PathNotFound);
        }

        it "keeps service messages verbatim" {
            service.inject_failure(ServiceError::Transport("connection reset by peer".into()));
            let err = setup.parameter("Iterations").expect("Iterations").read().unwrap_err();
            assert_eq!(err, Error::Transport("connection reset by peer".into()));
        }

        it "reports cancellation" {
            service.cancel();
            let err = setup.parameter("Iterations").expect("Iterations").read().unwrap_err();
            assert_eq!(err, Error::Cancelled);
        }

        it "rejects remote values of the wrong kind" {
            let tree = TreeBuilder::new(Arc::new(StringlyService), solver_schema())
                .build()
                .expect("build");
            let err = tree.root()
                .container("Setup").expect("Setup")
                .parameter("Iterations").expect("Iterations")
                .read()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::KindMismatch);
        }
    }

    describe "named-object keys" {
        it "checks existence only when asked to" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            service.create_object(zones.path(), "inlet").expect("create");

            assert!(zones.lookup_checked("inlet").is_ok());
            assert_eq!(zones.lookup_checked("outlet").unwrap_err().kind(), ErrorKind::PathNotFound);
            assert!(zones.lookup("outlet").is_ok());
        }

        it "reflects remote deletions" {
            let zones = tree.root().named_objects("Zones").expect("Zones");
            service.create_object(zones.path(), "a").expect("create");
            service.create_object(zones.path(), "b").expect("create");
            service.delete_object(zones.path(), "a").expect("delete");
            assert_eq!(zones.keys().expect("keys"), vec!["b"]);
        }
    }

    describe "commands" {
        it "leaves omitted optional arguments out of the request" {
            let iterate = tree.root().command("Iterate").expect("Iterate");
            service.on_command(iterate.path(), |args| {
                Ok(Some(Value::Int(100 + args.len() as i64)))
            });
            assert_eq!(
                iterate.invoke(Vec::<(String, Value)>::new()).expect("invoke"),
                Some(Value::Int(100))
            );
            assert_eq!(iterate.invoke([("count", 5)]).expect("invoke"), Some(Value::Int(101)));
        }

        it "answers with the return kind's default when the remote has no handler" {
            let iterate = tree.root().command("Iterate").expect("Iterate");
            assert_eq!(iterate.invoke([("count", 3)]).expect("invoke"), Some(Value::Int(0)));
        }

        it "passes coerced arguments to the remote" {
            let iterate = tree.root().command("Iterate").expect("Iterate");
            service.on_command(iterate.path(), |args| Ok(args.get("count").cloned()));
            assert_eq!(iterate.invoke([("count", 40)]).expect("invoke"), Some(Value::Int(40)));
        }

        it "yields nothing for commands without a return kind" {
            let reset = tree.root()
                .container("Setup").expect("Setup")
                .command("Reset").expect("Reset");
            service.on_command(reset.path(), |_| Ok(Some(Value::Bool(true))));
            assert_eq!(reset.invoke(Vec::<(String, Value)>::new()).expect("invoke"), None);
        }

        it "rejects unknown and mistyped arguments before transport" {
            let iterate = tree.root().command("Iterate").expect("Iterate");

            let unknown = iterate.invoke([("steps", 4)]).unwrap_err();
            assert_eq!(unknown.kind(), ErrorKind::SignatureMismatch);

            let mistyped = iterate.invoke([("count", "four")]).unwrap_err();
            assert_eq!(mistyped.kind(), ErrorKind::SignatureMismatch);

            assert_eq!(service.call_count(), 0);
        }

        it "surfaces command failures as RemoteError" {
            let iterate = tree.root().command("Iterate").expect("Iterate");
            service.on_command(iterate.path(), |_| {
                Err(ServiceError::RemoteError("divergence detected".into()))
            });
            let err = iterate.invoke([("count", 1)]).unwrap_err();
            assert_eq!(err, Error::RemoteError("divergence detected".into()));
        }

        it "rejects results of the wrong kind" {
            let tree = TreeBuilder::new(Arc::new(StringlyService), solver_schema())
                .build()
                .expect("build");
            let err = tree.root()
                .command("Iterate").expect("Iterate")
                .invoke(Vec::<(String, Value)>::new())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::KindMismatch);
        }
    }

    describe "detach" {
        it "is one-way and idempotent" {
            tree.detach();
            tree.detach();
            assert_eq!(tree.state(), TreeState::Detached);
        }
    }
}
