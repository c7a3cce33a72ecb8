mod run_modes;
