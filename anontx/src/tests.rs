mod transmission;
