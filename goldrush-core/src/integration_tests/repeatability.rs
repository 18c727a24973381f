use std::path::Path;

use crate::{controllers::ControllerConfig, harness::Harness, simulator::Simulator};

macro_rules! replication_test {
    ($config:ident, $controller:expr) => {
#[test]
fn $config() {
    let nb_replications = 3;

    let mut results: Vec<String> = Vec::new();

    for i in 0..nb_replications {
        print!("Run {}/{nb_replications} ... ", i + 1);
        let simulator =
            Simulator::from_config_path(Path::new(format!("test_config/{}.yaml", stringify!($config)).as_str())).map_err(|e| {
                println!("Error while loading config: {}", e.detailed_error());
                e
            }).unwrap();
        let mut harness = Harness::new(simulator, None);
        let summary = harness.run(&$controller).unwrap();

        results.push(format!("{:?}", summary));
        println!("OK");
    }

    let reference_result = &results[0];
    for result in results.iter().skip(1) {
        assert_eq!(
            result, reference_result,
            "{result} != {reference_result}"
        );
    }
}
    };
}

replication_test!(single_robot, [ControllerConfig::load_from_path(Path::new("test_config/quota_one.yaml")).unwrap()]);
replication_test!(two_robots, [ControllerConfig::default(), ControllerConfig::default()]);
