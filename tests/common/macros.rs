/// Asserts the size of one population.
#[macro_export]
macro_rules! assert_population {
    ($reality:expr, $pop:expr, $count:expr) => {
        assert_eq!(
            $reality.population_size($pop),
            $count,
            "Population {} size mismatch",
            $pop
        );
    };
}

/// Asserts that no population holds the given id.
#[macro_export]
macro_rules! assert_agent_absent {
    ($reality:expr, $id:expr) => {
        let id: holon_data::AgentId = $id.into();
        assert!(
            $reality.agent(&id).is_none(),
            "Agent {} should be gone but was found",
            id
        );
    };
}

/// Asserts an agent's energy within floating-point tolerance.
#[macro_export]
macro_rules! assert_energy {
    ($reality:expr, $id:expr, $expected:expr) => {
        let id: holon_data::AgentId = $id.into();
        let agent = $reality.agent(&id).expect("Agent not found");
        assert!(
            (agent.energy() - $expected).abs() < 1e-9,
            "Agent {} energy {} != {}",
            id,
            agent.energy(),
            $expected
        );
    };
}
