mod exposure_setup;
